//! Process configuration
//!
//! Read once at startup from the environment and passed by value into
//! the server. Nothing here is mutated after `main` builds it.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Default API listener address (TLS)
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8443";

/// Default port for health and metrics endpoints
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

pub const DEFAULT_CLUSTER_TEMPLATE: &str = "templates/cluster.yaml.tmpl";
pub const DEFAULT_MASTER_TEMPLATE: &str = "templates/master.yaml.tmpl";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GCP_PROJECT is not set")]
    MissingProject,

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Certificate and key for the API listener
#[derive(Debug, Clone, PartialEq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Project identifier substituted into manifests as `GCPProject`
    pub gcp_project: String,
    pub listen_addr: SocketAddr,
    /// `None` serves plain HTTP
    pub tls: Option<TlsConfig>,
    pub cluster_template: PathBuf,
    pub master_template: PathBuf,
    /// kubectl binary to invoke
    pub kubectl: String,
    /// Passed as `--context` on every kubectl invocation when set
    pub kubectl_context: Option<String>,
    pub health_port: u16,
}

impl Config {
    /// Load configuration from process environment variables
    ///
    /// Uses:
    /// - `GCP_PROJECT` (required)
    /// - `PKS_MOCK_LISTEN_ADDR`, `PKS_MOCK_TLS_CERT`, `PKS_MOCK_TLS_KEY`, `PKS_MOCK_TLS_DISABLED`
    /// - `PKS_MOCK_CLUSTER_TEMPLATE`, `PKS_MOCK_MASTER_TEMPLATE`
    /// - `PKS_MOCK_KUBECTL`, `PKS_MOCK_KUBECTL_CONTEXT`
    /// - `PKS_MOCK_HEALTH_PORT`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gcp_project = get("GCP_PROJECT").ok_or(ConfigError::MissingProject)?;

        let listen_addr = parse_var(
            "PKS_MOCK_LISTEN_ADDR",
            get("PKS_MOCK_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        )?;

        let tls_disabled = match get("PKS_MOCK_TLS_DISABLED") {
            Some(v) => parse_bool("PKS_MOCK_TLS_DISABLED", v)?,
            None => false,
        };
        let tls = if tls_disabled {
            None
        } else {
            Some(TlsConfig {
                cert_path: get("PKS_MOCK_TLS_CERT")
                    .unwrap_or_else(|| "server.crt".to_string())
                    .into(),
                key_path: get("PKS_MOCK_TLS_KEY")
                    .unwrap_or_else(|| "server.key".to_string())
                    .into(),
            })
        };

        let health_port = match get("PKS_MOCK_HEALTH_PORT") {
            Some(v) => parse_var("PKS_MOCK_HEALTH_PORT", v)?,
            None => DEFAULT_HEALTH_PORT,
        };

        Ok(Config {
            gcp_project,
            listen_addr,
            tls,
            cluster_template: get("PKS_MOCK_CLUSTER_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_CLUSTER_TEMPLATE.to_string())
                .into(),
            master_template: get("PKS_MOCK_MASTER_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_MASTER_TEMPLATE.to_string())
                .into(),
            kubectl: get("PKS_MOCK_KUBECTL").unwrap_or_else(|| "kubectl".to_string()),
            kubectl_context: get("PKS_MOCK_KUBECTL_CONTEXT"),
            health_port,
        })
    }
}

fn parse_var<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
