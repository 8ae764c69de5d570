// smbstatus invocation: binary discovery, bounded process execution, text parsing.

pub mod parser;

pub use parser::{parse_status, snapshot_from_output};

use crate::error::StatusError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, instrument};

/// Binary name searched for on PATH.
pub const SMBSTATUS: &str = "smbstatus";

/// Directories searched after PATH; smbstatus often lives in sbin, which is not on every PATH.
const FALLBACK_DIRS: &[&str] = &["/usr/bin", "/usr/sbin", "/usr/local/bin", "/usr/local/sbin"];

/// Raw result of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability to run the status tool with the given arguments.
/// Errors are reserved for runs that produced no exit status at all (spawn failure, timeout).
pub trait StatusTool: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<ToolOutput, StatusError>;
}

/// Runs the real smbstatus binary.
///
/// `run` blocks the calling thread on the given runtime handle, so it must be called
/// from a blocking context (e.g. inside `spawn_blocking`), never from async code.
pub struct SmbStatus {
    path: PathBuf,
    timeout: Duration,
    handle: Handle,
}

impl SmbStatus {
    pub fn new(path: PathBuf, timeout: Duration, handle: Handle) -> Self {
        Self {
            path,
            timeout,
            handle,
        }
    }
}

impl StatusTool for SmbStatus {
    #[instrument(skip(self), fields(tool = SMBSTATUS))]
    fn run(&self, args: &[&str]) -> Result<ToolOutput, StatusError> {
        let mut cmd = tokio::process::Command::new(&self.path);
        cmd.args(args).kill_on_drop(true);
        let output = self
            .handle
            .block_on(async { tokio::time::timeout(self.timeout, cmd.output()).await })
            .map_err(|_| {
                StatusError::InvocationFailed(format!("timed out after {:?}", self.timeout))
            })?
            .map_err(|e| {
                StatusError::InvocationFailed(format!("{}: {}", self.path.display(), e))
            })?;
        debug!(status = ?output.status, bytes = output.stdout.len(), "smbstatus finished");
        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Arguments for the full report: sessions, shares and locked files.
pub const FULL_REPORT_ARGS: &[&str] = &[];

/// Arguments for the byte-range lock report.
pub const BYTE_RANGE_LOCK_ARGS: &[&str] = &["-B"];

/// Run the tool once and parse what it printed.
pub fn collect_snapshot(
    tool: &dyn StatusTool,
    args: &[&str],
) -> Result<crate::models::StatusSnapshot, StatusError> {
    let output = tool.run(args)?;
    snapshot_from_output(&output)
}

/// Find the smbstatus binary: the configured path if given, else PATH, else the usual
/// system directories.
pub fn locate_smbstatus(configured: Option<&Path>) -> Result<PathBuf, StatusError> {
    if let Some(path) = configured {
        return if is_executable(path) {
            Ok(path.to_path_buf())
        } else {
            Err(StatusError::NotFound {
                name: path.display().to_string(),
            })
        };
    }
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path_var)
        .chain(FALLBACK_DIRS.iter().map(PathBuf::from))
        .map(|dir| dir.join(SMBSTATUS))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| StatusError::NotFound {
            name: SMBSTATUS.to_string(),
        })
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
