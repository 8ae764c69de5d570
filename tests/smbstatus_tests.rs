// Binary discovery and process execution for smbstatus

use smbmetrics::error::StatusError;
use smbmetrics::smbstatus::{SmbStatus, StatusTool, locate_smbstatus};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Handle;

#[test]
fn configured_path_that_does_not_exist_is_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("smbstatus");
    let err = locate_smbstatus(Some(&missing)).unwrap_err();
    assert!(matches!(err, StatusError::NotFound { .. }));
    assert!(err.to_string().contains("smbstatus"));
}

#[test]
fn configured_directory_is_not_an_executable() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(matches!(
        locate_smbstatus(Some(dir.path())),
        Err(StatusError::NotFound { .. })
    ));
}

#[cfg(unix)]
#[test]
fn configured_executable_is_accepted() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::TempDir::new().unwrap();
    let bin = dir.path().join("smbstatus");
    fs::write(&bin, "#!/bin/sh\necho Version 4.19.5\n").unwrap();
    fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
    assert_eq!(locate_smbstatus(Some(&bin)).unwrap(), bin);
}

#[cfg(unix)]
#[test]
fn configured_file_without_exec_bit_is_rejected() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::TempDir::new().unwrap();
    let bin = dir.path().join("smbstatus");
    fs::write(&bin, "not a program").unwrap();
    fs::set_permissions(&bin, fs::Permissions::from_mode(0o644)).unwrap();
    assert!(locate_smbstatus(Some(&bin)).is_err());
}

#[cfg(unix)]
fn write_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("smbstatus");
    fs::write(&bin, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
    bin
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn runner_captures_streams_and_exit_code() {
    let dir = tempfile::TempDir::new().unwrap();
    let bin = write_script(dir.path(), "echo out\necho err >&2\necho \"$@\" >&2\nexit 3");
    let tool = SmbStatus::new(bin, Duration::from_secs(5), Handle::current());

    let output = tokio::task::spawn_blocking(move || tool.run(&["-B"]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n-B\n");
    assert_eq!(output.exit_code, Some(3));
    assert!(!output.success());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn runner_reports_success_on_zero_exit() {
    let dir = tempfile::TempDir::new().unwrap();
    let bin = write_script(dir.path(), "echo Version 4.19.5");
    let tool = SmbStatus::new(bin, Duration::from_secs(5), Handle::current());

    let output = tokio::task::spawn_blocking(move || tool.run(&["-V"]))
        .await
        .unwrap()
        .unwrap();
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "Version 4.19.5");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn runner_times_out_as_invocation_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    let bin = write_script(dir.path(), "exec sleep 10");
    let tool = SmbStatus::new(bin, Duration::from_millis(300), Handle::current());

    let started = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(move || tool.run(&[])).await.unwrap();
    assert!(matches!(result, Err(StatusError::InvocationFailed(ref msg)) if msg.contains("timed out")));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn runner_spawn_failure_is_invocation_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    let tool = SmbStatus::new(
        dir.path().join("missing-smbstatus"),
        Duration::from_secs(1),
        Handle::current(),
    );
    let result = tokio::task::spawn_blocking(move || tool.run(&[])).await.unwrap();
    assert!(matches!(result, Err(StatusError::InvocationFailed(_))));
}
