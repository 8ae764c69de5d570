// Error taxonomy for smbstatus invocation, parsing and version resolution.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The status binary could not be found. Only raised at startup.
    #[error("{name} not found")]
    NotFound { name: String },

    /// `smbstatus -V` ran but did not report a usable version.
    #[error("unable to determine smbstatus version: {0}")]
    VersionUnresolvable(String),

    /// Spawn failure, timeout or non-zero exit.
    #[error("smbstatus invocation failed: {0}")]
    InvocationFailed(String),

    /// The tool exited cleanly but its output did not have the expected shape.
    #[error("malformed smbstatus output at line {line}: {reason}")]
    OutputMalformed { line: usize, reason: String },
}

impl StatusError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        StatusError::OutputMalformed {
            line,
            reason: reason.into(),
        }
    }
}
