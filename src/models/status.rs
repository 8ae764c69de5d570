// Typed view of one smbstatus report.

use serde::Serialize;

/// Everything parsed out of a single smbstatus invocation.
/// Empty output yields a snapshot with every sequence empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// From the `Samba version X` preamble, when the tool prints one.
    pub samba_version: Option<String>,
    pub sessions: Vec<Session>,
    pub tree_connections: Vec<TreeConnection>,
    pub shares: Vec<Share>,
    pub open_files: Vec<OpenFile>,
    pub locks: Vec<ByteRangeLock>,
}

impl StatusSnapshot {
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
            && self.tree_connections.is_empty()
            && self.shares.is_empty()
            && self.open_files.is_empty()
            && self.locks.is_empty()
    }
}

/// One authenticated SMB session (a row of the process table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Server process id; `vnn:pid` on clustered setups.
    pub session_id: String,
    pub username: String,
    pub group: String,
    /// Remote host or address, as used in the shares table.
    pub machine: String,
    /// Parenthesised detail such as `ipv4:10.0.0.5:50312`.
    pub remote_address: Option<String>,
    pub protocol: Option<String>,
    pub encryption: Option<String>,
    pub signing: Option<String>,
}

/// A tree connect: one remote machine attached to one share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConnection {
    pub service: String,
    pub server_id: String,
    pub machine: String,
    pub connected_at: String,
}

/// A share being served, keyed by the serving process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub name: String,
    pub server_id: String,
}

/// A file with at least one open handle, grouped by share path and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFile {
    pub share_path: String,
    pub name: String,
    pub opens: Vec<FileOpen>,
}

impl OpenFile {
    /// True when any handle on the file was opened for both reading and writing.
    pub fn has_read_write_open(&self) -> bool {
        self.opens.iter().any(|o| o.access.is_read_write())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOpen {
    pub pid: String,
    pub uid: String,
    pub deny_mode: String,
    pub access_mask: u32,
    pub access: AccessMode,
    pub oplock: String,
}

/// Access flags from the R/W column of the locked files table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessMode {
    pub read: bool,
    pub write: bool,
}

impl AccessMode {
    /// Parse the smbstatus R/W column (`RDONLY`, `WRONLY`, `RDWR`).
    pub fn from_column(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RDONLY" => AccessMode {
                read: true,
                write: false,
            },
            "WRONLY" => AccessMode {
                read: false,
                write: true,
            },
            "RDWR" => AccessMode {
                read: true,
                write: true,
            },
            _ => AccessMode::default(),
        }
    }

    pub fn is_read_write(&self) -> bool {
        self.read && self.write
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteRangeLock {
    pub pid: String,
    pub dev_inode: String,
    pub kind: LockKind,
    pub start: u64,
    pub size: u64,
    pub share_path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    Read,
    Write,
    Other(String),
}

impl From<&str> for LockKind {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "R" | "READ" => LockKind::Read,
            "W" | "WRITE" => LockKind::Write,
            other => LockKind::Other(other.to_string()),
        }
    }
}
