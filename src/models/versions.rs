// Version metadata reported through smb_metrics_status.

use serde::Serialize;

/// Best-effort version labels. Any field may be empty when its source is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Exporter build version.
    pub version: String,
    /// Exporter build commit.
    pub commit_id: String,
    /// Version reported by `smbstatus -V`.
    pub tool_version: String,
    pub samba_image: String,
    pub samba_version: String,
    pub ctdb_version: String,
}
