//! kubectl invocation
//!
//! The API never talks to a Kubernetes API server itself. Every side
//! effect goes through a `kubectl` subprocess:
//! - Argument mode: fixed argument list, exit status is the only signal
//! - Apply mode: `apply -f -` with the rendered manifest piped to stdin
//!
//! stdout/stderr of the child are inherited, never captured or parsed.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write manifest to stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("{program} {args} exited with {status}")]
    Exit {
        program: String,
        args: String,
        status: ExitStatus,
    },
}

/// Kinds of namespaced resources removed before a namespace is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Machines,
    Clusters,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Machines => "machines",
            ResourceKind::Clusters => "clusters",
        }
    }
}

/// External cluster-management tool
///
/// `run` and `apply` are the two invocation modes; the provided methods
/// build the exact argument lists the handlers need.
#[async_trait]
pub trait ClusterTool: Send + Sync {
    /// Run the tool with a literal argument list
    async fn run(&self, args: &[&str]) -> Result<(), ToolError>;

    /// Run `apply -f -` with `manifest` on stdin
    async fn apply(&self, manifest: &str) -> Result<(), ToolError>;

    async fn create_namespace(&self, name: &str) -> Result<(), ToolError> {
        self.run(&["create", "ns", name]).await
    }

    async fn delete_all(&self, namespace: &str, kind: ResourceKind) -> Result<(), ToolError> {
        self.run(&["-n", namespace, "delete", "--all", kind.as_str()])
            .await
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ToolError> {
        self.run(&["delete", "ns", name]).await
    }
}

/// Arguments for the apply mode
pub const APPLY_ARGS: [&str; 3] = ["apply", "-f", "-"];

/// `ClusterTool` backed by a real `kubectl` binary
#[derive(Debug, Clone)]
pub struct KubectlCli {
    program: String,
    base_args: Vec<String>,
}

impl KubectlCli {
    pub fn new(program: impl Into<String>) -> Self {
        KubectlCli {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Arguments placed before every invocation's own arguments
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Select a kubeconfig context for every invocation
    pub fn with_context(self, context: &str) -> Self {
        self.with_base_args(["--context", context])
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn base_args(&self) -> &[String] {
        &self.base_args
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    fn check_status(&self, args: &[&str], status: ExitStatus) -> Result<(), ToolError> {
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Exit {
                program: self.program.clone(),
                args: args.join(" "),
                status,
            })
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> ToolError {
        ToolError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl ClusterTool for KubectlCli {
    async fn run(&self, args: &[&str]) -> Result<(), ToolError> {
        let start = Instant::now();
        debug!(program = %self.program, args = ?args, "Running kubectl");

        let status = self
            .command(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        info!(
            args = ?args,
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "kubectl finished"
        );
        self.check_status(args, status)
    }

    async fn apply(&self, manifest: &str) -> Result<(), ToolError> {
        let start = Instant::now();
        debug!(program = %self.program, bytes = manifest.len(), "Applying manifest");

        let mut child = self
            .command(&APPLY_ARGS)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Write, then close stdin so kubectl sees EOF. The child is waited
        // on regardless of the write outcome.
        let written = match child.stdin.take() {
            Some(mut stdin) => {
                let result = stdin.write_all(manifest.as_bytes()).await;
                let result = match result {
                    Ok(()) => stdin.shutdown().await,
                    Err(e) => Err(e),
                };
                drop(stdin);
                result
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin was not captured",
            )),
        };

        let status = child.wait().await.map_err(|e| self.spawn_error(e))?;

        info!(
            args = ?APPLY_ARGS,
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "kubectl finished"
        );

        if let Err(e) = written {
            warn!(error = %e, status = %status, "Manifest was not fully written to kubectl");
            return Err(ToolError::Stdin(e));
        }
        self.check_status(&APPLY_ARGS, status)
    }
}

#[cfg(test)]
#[path = "kubectl_test.rs"]
mod tests;
