// Prometheus collectors: versions, activity totals, shares/locks.
// Each scrape runs every collector independently; nothing is cached between scrapes,
// and two collectors in the same scrape may see smbstatus at different moments.

mod activity;
mod shares;
mod versions;

pub use activity::{ACTIVITY_METRICS, ActivityCollector};
pub use shares::{SHARES_METRICS, SharesCollector, SharesReport};
pub use versions::{VERSIONS_METRICS, VersionsCollector};

use std::sync::Arc;

use prometheus::core::{Collector, Desc, Describer};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;
use tracing::{info, warn};

use crate::smbstatus::StatusTool;
use crate::versions::VersionResolver;

/// Prefix of every exported metric.
pub const NAMESPACE: &str = "smb";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid metric descriptor: {0}")]
    Descriptor(#[from] prometheus::Error),

    /// A collector's descriptors clash with one already registered.
    #[error("collector {collector} conflicts with a registered collector: {reason}")]
    Conflict {
        collector: &'static str,
        reason: String,
    },
}

/// Static description of one gauge family.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub subsystem: &'static str,
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl MetricDef {
    /// Fully qualified name, e.g. `smb_sessions_total`.
    pub fn fq_name(&self) -> String {
        format!("{}_{}_{}", NAMESPACE, self.subsystem, self.name)
    }

    fn opts(&self) -> Opts {
        let opts = Opts::new(self.name, self.help)
            .namespace(NAMESPACE)
            .subsystem(self.subsystem);
        if self.labels.is_empty() {
            opts
        } else {
            opts.variable_labels(self.labels.iter().map(|l| l.to_string()).collect())
        }
    }

    fn describe(&self) -> prometheus::Result<Desc> {
        self.opts().describe()
    }

    /// One unlabelled sample.
    fn gauge(&self, value: f64) -> Vec<MetricFamily> {
        match Gauge::with_opts(self.opts()) {
            Ok(g) => {
                g.set(value);
                g.collect()
            }
            Err(e) => {
                warn!(metric = %self.fq_name(), error = %e, "failed to build gauge");
                Vec::new()
            }
        }
    }

    /// One sample per label-value set. Label values must match `labels` in order.
    fn labeled<'a, I>(&self, samples: I) -> Vec<MetricFamily>
    where
        I: IntoIterator<Item = (Vec<&'a str>, f64)>,
    {
        let vec = match GaugeVec::new(self.opts(), self.labels) {
            Ok(v) => v,
            Err(e) => {
                warn!(metric = %self.fq_name(), error = %e, "failed to build gauge vec");
                return Vec::new();
            }
        };
        for (values, value) in samples {
            match vec.get_metric_with_label_values(values.as_slice()) {
                Ok(g) => g.set(value),
                Err(e) => warn!(metric = %self.fq_name(), error = %e, "dropping sample"),
            }
        }
        vec.collect()
    }
}

fn describe_all(defs: &[MetricDef]) -> Result<Vec<Desc>, RegistryError> {
    Ok(defs
        .iter()
        .map(MetricDef::describe)
        .collect::<prometheus::Result<Vec<_>>>()?)
}

/// The closed set of collector kinds served by the exporter.
pub enum SmbCollector {
    Versions(VersionsCollector),
    Activity(ActivityCollector),
    Shares(SharesCollector),
}

impl SmbCollector {
    pub fn name(&self) -> &'static str {
        match self {
            SmbCollector::Versions(_) => "versions",
            SmbCollector::Activity(_) => "activity",
            SmbCollector::Shares(_) => "shares",
        }
    }
}

impl Collector for SmbCollector {
    fn desc(&self) -> Vec<&Desc> {
        match self {
            SmbCollector::Versions(c) => c.descs.iter().collect(),
            SmbCollector::Activity(c) => c.descs.iter().collect(),
            SmbCollector::Shares(c) => c.descs.iter().collect(),
        }
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self {
            SmbCollector::Versions(c) => c.collect_families(),
            SmbCollector::Activity(c) => c.collect_families(),
            SmbCollector::Shares(c) => c.collect_families(),
        }
    }
}

/// The standard three collectors, sharing one tool and one resolver.
pub fn default_collectors(
    tool: Arc<dyn StatusTool>,
    resolver: Arc<VersionResolver>,
) -> Result<Vec<SmbCollector>, RegistryError> {
    Ok(vec![
        SmbCollector::Versions(VersionsCollector::new(resolver)?),
        SmbCollector::Activity(ActivityCollector::new(tool.clone())?),
        SmbCollector::Shares(SharesCollector::new(tool)?),
    ])
}

/// Register every collector into a fresh registry. Any clash aborts construction.
pub fn build_registry(collectors: Vec<SmbCollector>) -> Result<Registry, RegistryError> {
    let registry = Registry::new();
    for collector in collectors {
        let name = collector.name();
        registry
            .register(Box::new(collector))
            .map_err(|e| RegistryError::Conflict {
                collector: name,
                reason: e.to_string(),
            })?;
        info!(collector = name, "registered collector");
    }
    Ok(registry)
}

/// Gather every collector and encode in the Prometheus text format.
pub fn render(registry: &Registry) -> prometheus::Result<String> {
    let families = registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
