// Domain models: parsed smbstatus reports and version metadata

mod status;
mod versions;

pub use status::{
    AccessMode, ByteRangeLock, FileOpen, LockKind, OpenFile, Session, Share, StatusSnapshot,
    TreeConnection,
};
pub use versions::VersionInfo;
