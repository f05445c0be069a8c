//! Manifest templates
//!
//! Two templates are loaded at startup (cluster and master) and rendered
//! per request against [`TemplateData`]. Substitution uses minijinja's
//! `{{ Field }}` syntax with strict undefined handling, so a template that
//! references a field we do not provide fails to render instead of
//! producing an empty value.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kubelet version baked into every master manifest
pub const KUBELET_VERSION: &str = match option_env!("PKS_MOCK_KUBELET_VERSION") {
    Some(v) => v,
    None => "1.9.4",
};

/// Control plane version baked into every master manifest
pub const CONTROL_PLANE_VERSION: &str = match option_env!("PKS_MOCK_CONTROL_PLANE_VERSION") {
    Some(v) => v,
    None => "1.9.4",
};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Error reading {name} template {path}: {source}")]
    Read {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing {name} template: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error("Error rendering {name} template: {source}")]
    Render {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },
}

/// The two manifests applied when a cluster is created, in apply order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Cluster,
    Master,
}

impl ManifestKind {
    pub fn name(&self) -> &'static str {
        match self {
            ManifestKind::Cluster => "cluster",
            ManifestKind::Master => "master",
        }
    }
}

/// Values substituted into the manifest templates
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TemplateData {
    #[serde(rename = "ClusterName")]
    pub cluster_name: String,
    #[serde(rename = "KubeletVersion")]
    pub kubelet_version: String,
    #[serde(rename = "ControlPlaneVersion")]
    pub control_plane_version: String,
    #[serde(rename = "GCPProject")]
    pub gcp_project: String,
}

impl TemplateData {
    /// Template data for a cluster, using the built-in versions
    pub fn for_cluster(cluster_name: &str, gcp_project: &str) -> Self {
        TemplateData {
            cluster_name: cluster_name.to_string(),
            kubelet_version: KUBELET_VERSION.to_string(),
            control_plane_version: CONTROL_PLANE_VERSION.to_string(),
            gcp_project: gcp_project.to_string(),
        }
    }
}

/// Parsed cluster and master templates
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct ManifestTemplates {
    env: Environment<'static>,
}

impl ManifestTemplates {
    /// Read and parse both templates from disk
    pub fn load(cluster_path: &Path, master_path: &Path) -> Result<Self, TemplateError> {
        let cluster = read_template(ManifestKind::Cluster, cluster_path)?;
        let master = read_template(ManifestKind::Master, master_path)?;
        Self::from_sources(cluster, master)
    }

    /// Parse both templates from in-memory sources
    pub fn from_sources(
        cluster: impl Into<String>,
        master: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let cluster: String = cluster.into();
        let master: String = master.into();

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Manifests must come out byte-for-byte as written
        env.set_keep_trailing_newline(true);

        for (kind, source) in [
            (ManifestKind::Cluster, cluster),
            (ManifestKind::Master, master),
        ] {
            env.add_template_owned(kind.name(), source)
                .map_err(|source| TemplateError::Parse {
                    name: kind.name(),
                    source,
                })?;
        }

        Ok(ManifestTemplates { env })
    }

    /// Render one manifest to text
    pub fn render(
        &self,
        kind: ManifestKind,
        data: &TemplateData,
    ) -> Result<String, TemplateError> {
        let render_err = |source: minijinja::Error| TemplateError::Render {
            name: kind.name(),
            source,
        };

        let template = self.env.get_template(kind.name()).map_err(render_err)?;
        template.render(data).map_err(render_err)
    }
}

fn read_template(kind: ManifestKind, path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
        name: kind.name(),
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
