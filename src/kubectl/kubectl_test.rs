//! Tests for kubectl invocation
//!
//! `sh -c <script> kubectl ...` stands in for kubectl: the invocation's
//! arguments become the script's positional parameters.

use super::*;
use std::path::Path;

fn shell_tool(script: &str) -> KubectlCli {
    KubectlCli::new("sh").with_base_args(["-c", script, "kubectl"])
}

fn recording_tool(log: &Path) -> KubectlCli {
    shell_tool(&format!("printf '%s\\n' \"$*\" >> '{}'", log.display()))
}

fn read_log(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_run_succeeds_on_zero_exit() {
    let tool = KubectlCli::new("true");
    tool.run(&["create", "ns", "demo"])
        .await
        .expect("zero exit should succeed");
}

#[tokio::test]
async fn test_run_fails_on_nonzero_exit() {
    let tool = KubectlCli::new("false");
    let err = tool
        .run(&["create", "ns", "demo"])
        .await
        .expect_err("non-zero exit must fail");

    match err {
        ToolError::Exit { program, args, status } => {
            assert_eq!(program, "false");
            assert_eq!(args, "create ns demo");
            assert!(!status.success());
        }
        other => panic!("expected Exit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_fails_when_binary_is_missing() {
    let tool = KubectlCli::new("/nonexistent/kubectl-for-tests");
    let err = tool
        .run(&["get", "ns"])
        .await
        .expect_err("missing binary must fail");

    assert!(matches!(err, ToolError::Spawn { .. }));
}

#[tokio::test]
async fn test_namespace_operations_use_exact_arguments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("calls.log");
    let tool = recording_tool(&log);

    tool.create_namespace("demo").await.unwrap();
    tool.delete_all("demo", ResourceKind::Machines).await.unwrap();
    tool.delete_all("demo", ResourceKind::Clusters).await.unwrap();
    tool.delete_namespace("demo").await.unwrap();

    assert_eq!(
        read_log(&log),
        vec![
            "create ns demo",
            "-n demo delete --all machines",
            "-n demo delete --all clusters",
            "delete ns demo",
        ]
    );
}

#[tokio::test]
async fn test_context_is_prefixed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("calls.log");
    let tool = recording_tool(&log).with_context("kind-mgmt");

    tool.delete_namespace("demo").await.unwrap();

    assert_eq!(read_log(&log), vec!["--context kind-mgmt delete ns demo"]);
}

#[tokio::test]
async fn test_apply_pipes_manifest_to_stdin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args_log = dir.path().join("args.log");
    let stdin_out = dir.path().join("stdin.yaml");
    let tool = shell_tool(&format!(
        "printf '%s\\n' \"$*\" > '{}'; cat > '{}'",
        args_log.display(),
        stdin_out.display()
    ));
    let manifest = "kind: Cluster\nmetadata:\n  name: demo\n";

    tool.apply(manifest).await.expect("apply should succeed");

    assert_eq!(read_log(&args_log), vec!["apply -f -"]);
    assert_eq!(std::fs::read_to_string(&stdin_out).unwrap(), manifest);
}

#[tokio::test]
async fn test_apply_fails_on_nonzero_exit() {
    let tool = shell_tool("cat > /dev/null; exit 3");

    let err = tool
        .apply("kind: Cluster\n")
        .await
        .expect_err("non-zero exit must fail");

    match err {
        ToolError::Exit { args, status, .. } => {
            assert_eq!(args, "apply -f -");
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected Exit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_apply_fails_when_child_ignores_stdin() {
    // The child may exit before the manifest is written; either the
    // write or the exit status reports the failure.
    let tool = KubectlCli::new("false");

    let result = tool.apply("kind: Cluster\n").await;

    assert!(matches!(
        result,
        Err(ToolError::Exit { .. }) | Err(ToolError::Stdin(_))
    ));
}

#[tokio::test]
async fn test_apply_fails_when_binary_is_missing() {
    let tool = KubectlCli::new("/nonexistent/kubectl-for-tests");

    let err = tool.apply("kind: Cluster\n").await.expect_err("must fail");

    assert!(matches!(err, ToolError::Spawn { .. }));
}

#[test]
fn test_resource_kind_names() {
    assert_eq!(ResourceKind::Machines.as_str(), "machines");
    assert_eq!(ResourceKind::Clusters.as_str(), "clusters");
}
