// smb_service_remote / smb_remote_service relationship gauges, plus share and lock totals.

use std::sync::Arc;

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use tracing::{instrument, warn};

use super::{MetricDef, RegistryError, describe_all};
use crate::aggregation::{
    RelationMap, machine_to_services, service_to_machines, total_locks, total_shares,
};
use crate::smbstatus::{BYTE_RANGE_LOCK_ARGS, FULL_REPORT_ARGS, StatusTool, collect_snapshot};

pub const SHARES_METRICS: [MetricDef; 4] = [
    MetricDef {
        subsystem: "service",
        name: "remote",
        help: "Number of remote machines connected to service",
        labels: &["service"],
    },
    MetricDef {
        subsystem: "remote",
        name: "service",
        help: "Number of services provided to remote machine",
        labels: &["machine"],
    },
    MetricDef {
        subsystem: "shares",
        name: "total",
        help: "Number of shares currently being served",
        labels: &[],
    },
    MetricDef {
        subsystem: "locks",
        name: "total",
        help: "Number of byte-range locks currently held",
        labels: &[],
    },
];

pub struct SharesCollector {
    tool: Arc<dyn StatusTool>,
    pub(super) descs: Vec<Desc>,
}

/// What one shares collection produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharesReport {
    pub service_to_machines: RelationMap,
    pub machine_to_services: RelationMap,
    pub total_shares: usize,
    pub total_locks: usize,
}

impl SharesCollector {
    pub fn new(tool: Arc<dyn StatusTool>) -> Result<Self, RegistryError> {
        Ok(Self {
            tool,
            descs: describe_all(&SHARES_METRICS)?,
        })
    }

    /// Runs its own full report (not shared with the activity collector) and a
    /// separate byte-range lock report.
    #[instrument(skip(self), fields(collector = "shares"))]
    pub fn report(&self) -> SharesReport {
        let mut report = match collect_snapshot(self.tool.as_ref(), FULL_REPORT_ARGS) {
            Ok(snapshot) => SharesReport {
                service_to_machines: service_to_machines(&snapshot),
                machine_to_services: machine_to_services(&snapshot),
                total_shares: total_shares(&snapshot),
                total_locks: 0,
            },
            Err(e) => {
                warn!(error = %e, "smbstatus unavailable, reporting no shares");
                SharesReport::default()
            }
        };
        report.total_locks = match collect_snapshot(self.tool.as_ref(), BYTE_RANGE_LOCK_ARGS) {
            Ok(snapshot) => total_locks(&snapshot),
            Err(e) => {
                warn!(error = %e, "smbstatus lock report unavailable, reporting zero locks");
                0
            }
        };
        report
    }

    pub(super) fn collect_families(&self) -> Vec<MetricFamily> {
        let report = self.report();
        let [service_remote, remote_service, shares_total, locks_total] = &SHARES_METRICS;

        let mut families = service_remote.labeled(
            report
                .service_to_machines
                .iter()
                .map(|(service, machines)| (vec![service.as_str()], machines.len() as f64)),
        );
        families.extend(
            remote_service.labeled(
                report
                    .machine_to_services
                    .iter()
                    .map(|(machine, services)| (vec![machine.as_str()], services.len() as f64)),
            ),
        );
        families.extend(shares_total.gauge(report.total_shares as f64));
        families.extend(locks_total.gauge(report.total_locks as f64));
        families
    }
}
