// Version resolution: smbstatus -V, build metadata, optional cluster-provided component versions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::error::StatusError;
use crate::models::VersionInfo;
use crate::smbstatus::StatusTool;
use crate::version;

pub const SAMBA_IMAGE_KEY: &str = "samba-image";
pub const SAMBA_VERSION_KEY: &str = "samba-version";
pub const CTDB_VERSION_KEY: &str = "ctdb-version";

/// Exporter build metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit_id: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: version::VERSION.to_string(),
            commit_id: version::COMMIT_ID.to_string(),
        }
    }
}

/// Source of component versions known to the cluster (image tags, sidecar versions).
pub trait ClusterMetadata: Send + Sync {
    fn component_versions(&self) -> anyhow::Result<HashMap<String, String>>;
}

/// Reads a Kubernetes downward-API file (`key="value"` per line).
/// Keys may be qualified (`example.com/samba-image`); only the last segment is kept.
pub struct PodInfoFile {
    path: PathBuf,
}

impl PodInfoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ClusterMetadata for PodInfoFile {
    fn component_versions(&self) -> anyhow::Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| anyhow::anyhow!("read {}: {}", self.path.display(), e))?;
        Ok(parse_pod_info(&content))
    }
}

/// Parse downward-API `key="value"` lines. Lines without `=` are skipped.
pub fn parse_pod_info(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            let key = key.rsplit('/').next().unwrap_or(key);
            (key.to_string(), value.trim().trim_matches('"').to_string())
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// This exporter's own pod as `namespace/name`, from the downward-API environment
/// (`POD_NAMESPACE`, `POD_NAME`). Falls back to `HOSTNAME`, which Kubernetes sets to the
/// pod name.
pub fn pod_identity(env: impl Fn(&str) -> Option<String>) -> Option<String> {
    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
    let name = non_empty("POD_NAME").or_else(|| non_empty("HOSTNAME"))?;
    Some(match non_empty("POD_NAMESPACE") {
        Some(namespace) => format!("{}/{}", namespace, name),
        None => name,
    })
}

/// Outcome of one resolution: best-effort fields plus the local tool error, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub info: VersionInfo,
    pub tool_error: Option<StatusError>,
}

impl ResolvedVersions {
    /// 0 when the local tool version resolved, 1 otherwise.
    pub fn status(&self) -> u8 {
        u8::from(self.tool_error.is_some())
    }
}

pub struct VersionResolver {
    tool: Arc<dyn StatusTool>,
    cluster: Option<Arc<dyn ClusterMetadata>>,
    build: BuildInfo,
}

impl VersionResolver {
    pub fn new(
        tool: Arc<dyn StatusTool>,
        cluster: Option<Arc<dyn ClusterMetadata>>,
        build: BuildInfo,
    ) -> Self {
        Self {
            tool,
            cluster,
            build,
        }
    }

    /// Run `smbstatus -V` and extract the version (`Version 4.19.5` -> `4.19.5`).
    pub fn tool_version(&self) -> Result<String, StatusError> {
        let output = self.tool.run(&["-V"])?;
        if !output.success() {
            return Err(StatusError::InvocationFailed(match output.exit_code {
                Some(code) => format!("smbstatus -V exit status {}", code),
                None => "smbstatus -V terminated by signal".to_string(),
            }));
        }
        parse_tool_version(&output.stdout)
    }

    /// Resolve every field that can be resolved. Never fails as a whole.
    #[instrument(skip(self))]
    pub fn resolve(&self) -> ResolvedVersions {
        let mut info = VersionInfo {
            version: self.build.version.clone(),
            commit_id: self.build.commit_id.clone(),
            ..Default::default()
        };

        let components = match &self.cluster {
            Some(cluster) => cluster.component_versions().unwrap_or_else(|e| {
                warn!(error = %e, "cluster component versions unavailable");
                HashMap::new()
            }),
            None => HashMap::new(),
        };
        let component = |key: &str| components.get(key).cloned().unwrap_or_default();
        info.samba_image = component(SAMBA_IMAGE_KEY);
        info.ctdb_version = component(CTDB_VERSION_KEY);
        info.samba_version = component(SAMBA_VERSION_KEY);

        let tool_error = match self.tool_version() {
            Ok(v) => {
                if info.samba_version.is_empty() {
                    info.samba_version = v.clone();
                }
                info.tool_version = v;
                None
            }
            Err(e) => {
                warn!(error = %e, "smbstatus version unavailable");
                Some(e)
            }
        };

        ResolvedVersions { info, tool_error }
    }
}

fn parse_tool_version(stdout: &str) -> Result<String, StatusError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| StatusError::VersionUnresolvable("empty output".to_string()))?;
    let version = line
        .strip_prefix("Version")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StatusError::VersionUnresolvable(format!("unexpected output {:?}", line)))?;
    Ok(version.to_string())
}
