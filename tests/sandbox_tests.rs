#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use codegauge::errors::{SandboxError, ToolError};
use codegauge::sandbox::Sandbox;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn test_captures_stdout_and_stderr() {
    let dir = TempDir::new().unwrap();
    let output = Sandbox::new()
        .run(&["sh", "-c", "echo out; echo err >&2"], dir.path(), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(output.stdout.trim(), "out");
    assert_eq!(output.stderr.trim(), "err");
    assert_eq!(output.exit_code, Some(0));
}

#[tokio::test]
async fn test_runs_in_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

    let output = Sandbox::new()
        .run(&["cat", "marker.txt"], dir.path(), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(output.stdout, "here");
}

#[tokio::test]
async fn test_timeout_kills_the_process() {
    let dir = TempDir::new().unwrap();
    let start = Instant::now();

    let err = Sandbox::new()
        .run(
            &["sh", "-c", "echo $$ > pid; exec sleep 30"],
            dir.path(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(matches!(err, SandboxError::Timeout { seconds, .. } if seconds == 1.0));

    let pid = std::fs::read_to_string(dir.path().join("pid")).unwrap();
    if Path::new("/proc/self").exists() {
        // The kill is delivered on drop; give the kernel a moment to deliver it
        let deadline = Instant::now() + Duration::from_secs(2);
        while is_running(pid.trim()) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!is_running(pid.trim()), "process {} survived", pid.trim());
    }
}

/// Whether `/proc` lists `pid` as a live (non-zombie) process
fn is_running(pid: &str) -> bool {
    let stat = match std::fs::read_to_string(Path::new("/proc").join(pid).join("stat")) {
        Ok(stat) => stat,
        Err(_) => return false,
    };
    // State follows the parenthesized command name
    stat.rsplit_once(") ")
        .and_then(|(_, rest)| rest.chars().next())
        .is_some_and(|state| state != 'Z' && state != 'X')
}

#[tokio::test]
async fn test_sub_second_timeout_is_reported_exactly() {
    let dir = TempDir::new().unwrap();
    let err = Sandbox::new()
        .run(&["sleep", "5"], dir.path(), Duration::from_millis(250))
        .await
        .unwrap_err();

    assert!(matches!(err, SandboxError::Timeout { seconds, .. } if seconds == 0.25));
    assert_eq!(
        err.to_string(),
        "Command 'sleep' exceeded timeout of 0.25 seconds"
    );
}

#[tokio::test]
async fn test_non_zero_exit_fails_with_stderr() {
    let dir = TempDir::new().unwrap();
    let err = Sandbox::new()
        .run(&["sh", "-c", "echo broken >&2; exit 3"], dir.path(), TIMEOUT)
        .await
        .unwrap_err();

    match err {
        SandboxError::Failed { code, output, .. } => {
            assert_eq!(code, Some(3));
            assert_eq!(output.trim(), "broken");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_failure_output_falls_back_to_stdout() {
    let dir = TempDir::new().unwrap();
    let err = Sandbox::new()
        .run(&["sh", "-c", "echo only-stdout; exit 2"], dir.path(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::Failed { ref output, .. } if output.trim() == "only-stdout"));
}

#[tokio::test]
async fn test_findings_exit_code_is_success() {
    let dir = TempDir::new().unwrap();
    let sandbox = Sandbox::strict().with_findings_exit_code("sh", 1);

    let output = sandbox
        .run(&["sh", "-c", "echo '[]'; exit 1"], dir.path(), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(output.exit_code, Some(1));
    assert_eq!(output.stdout.trim(), "[]");

    assert!(Sandbox::new().accepts("ruff", 1));
    assert!(Sandbox::new().accepts("/usr/local/bin/bandit", 1));
    assert!(!Sandbox::new().accepts("radon", 1));
    assert!(!Sandbox::strict().accepts("ruff", 1));
}

#[tokio::test]
async fn test_rejected_inputs_spawn_nothing() {
    let dir = TempDir::new().unwrap();
    let empty: [&str; 0] = [];

    let err = Sandbox::new().run(&empty, dir.path(), TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SandboxError::EmptyCommand));

    let err = Sandbox::new()
        .run(&["true"], Path::new("/definitely/not/here"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::MissingDirectory(_)));
}

#[tokio::test]
async fn test_missing_program() {
    let dir = TempDir::new().unwrap();
    let err = Sandbox::new()
        .run(&["codegauge-no-such-tool"], dir.path(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::NotFound { .. }));

    let tool_err = ToolError::from_sandbox("ruff", err);
    assert!(matches!(tool_err, ToolError::Unavailable { ref tool } if tool == "ruff"));

    assert!(!Sandbox::new().is_available("codegauge-no-such-tool").await);
    assert_eq!(Sandbox::new().version("codegauge-no-such-tool").await, None);
}

#[test]
fn test_tool_error_mapping() {
    let timeout = ToolError::from_sandbox(
        "bandit",
        SandboxError::Timeout {
            program: "bandit".to_string(),
            seconds: 120.0,
        },
    );
    assert!(matches!(timeout, ToolError::Timeout { seconds, .. } if seconds == 120.0));
    assert_eq!(timeout.tool(), "bandit");

    let failed = ToolError::from_sandbox(
        "radon",
        SandboxError::Failed {
            program: "radon".to_string(),
            code: Some(2),
            output: "usage".to_string(),
        },
    );
    assert_eq!(
        failed.to_string(),
        "Tool 'radon' failed with exit code 2: usage"
    );
}
