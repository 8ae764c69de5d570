// smb_metrics_status: version labels plus an up/down flag for the local tool.

use std::sync::Arc;

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;

use super::{MetricDef, RegistryError, describe_all};
use crate::versions::VersionResolver;

pub const VERSIONS_METRICS: [MetricDef; 1] = [MetricDef {
    subsystem: "metrics",
    name: "status",
    help: "Current metrics-collector status versions",
    labels: &["version", "commitid", "sambaimage", "sambavers", "ctdbvers"],
}];

pub struct VersionsCollector {
    resolver: Arc<VersionResolver>,
    pub(super) descs: Vec<Desc>,
}

impl VersionsCollector {
    pub fn new(resolver: Arc<VersionResolver>) -> Result<Self, RegistryError> {
        Ok(Self {
            resolver,
            descs: describe_all(&VERSIONS_METRICS)?,
        })
    }

    pub(super) fn collect_families(&self) -> Vec<MetricFamily> {
        let resolved = self.resolver.resolve();
        let info = &resolved.info;
        VERSIONS_METRICS[0].labeled([(
            vec![
                info.version.as_str(),
                info.commit_id.as_str(),
                info.samba_image.as_str(),
                info.samba_version.as_str(),
                info.ctdb_version.as_str(),
            ],
            f64::from(resolved.status()),
        )])
    }
}
