// smb_sessions_total, smb_tcon_total, smb_users_total, smb_openfiles_*

use std::sync::Arc;

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use tracing::{instrument, warn};

use super::{MetricDef, RegistryError, describe_all};
use crate::aggregation::Totals;
use crate::smbstatus::{FULL_REPORT_ARGS, StatusTool, collect_snapshot};

pub const ACTIVITY_METRICS: [MetricDef; 6] = [
    MetricDef {
        subsystem: "sessions",
        name: "total",
        help: "Number of currently active SMB sessions",
        labels: &[],
    },
    MetricDef {
        subsystem: "tcon",
        name: "total",
        help: "Number of currently active SMB tree-connections",
        labels: &[],
    },
    MetricDef {
        subsystem: "users",
        name: "total",
        help: "Number of currently active SMB users",
        labels: &[],
    },
    MetricDef {
        subsystem: "openfiles",
        name: "total",
        help: "Number of currently open files",
        labels: &[],
    },
    MetricDef {
        subsystem: "openfiles",
        name: "opens",
        help: "Number of open file-handles",
        labels: &[],
    },
    MetricDef {
        subsystem: "openfiles",
        name: "access_rw",
        help: "Number of open files with read-write access mode",
        labels: &[],
    },
];

/// Activity totals from one fresh smbstatus report per scrape.
/// A failed report yields all six totals as zero; no family is ever omitted.
pub struct ActivityCollector {
    tool: Arc<dyn StatusTool>,
    pub(super) descs: Vec<Desc>,
}

impl ActivityCollector {
    pub fn new(tool: Arc<dyn StatusTool>) -> Result<Self, RegistryError> {
        Ok(Self {
            tool,
            descs: describe_all(&ACTIVITY_METRICS)?,
        })
    }

    #[instrument(skip(self), fields(collector = "activity"))]
    pub fn totals(&self) -> Totals {
        match collect_snapshot(self.tool.as_ref(), FULL_REPORT_ARGS) {
            Ok(snapshot) => Totals::from_snapshot(&snapshot),
            Err(e) => {
                warn!(error = %e, "smbstatus unavailable, reporting zero activity");
                Totals::default()
            }
        }
    }

    pub(super) fn collect_families(&self) -> Vec<MetricFamily> {
        let t = self.totals();
        let values = [
            t.sessions,
            t.tree_connections,
            t.connected_users,
            t.open_files,
            t.open_file_handles,
            t.open_files_access_rw,
        ];
        ACTIVITY_METRICS
            .iter()
            .zip(values)
            .flat_map(|(def, value)| def.gauge(value as f64))
            .collect()
    }
}
