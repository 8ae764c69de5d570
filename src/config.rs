use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Config file used when CONFIG_FILE is not set. Missing is fine; defaults apply.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub smbstatus: SmbStatusConfig,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Path the Prometheus scraper pulls from.
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9922,
            host: "0.0.0.0".into(),
            metrics_path: "/metrics".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmbStatusConfig {
    /// Explicit binary location; searched on PATH when unset.
    pub path: Option<PathBuf>,
    /// Upper bound for a single smbstatus run.
    pub timeout_secs: u64,
}

impl Default for SmbStatusConfig {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: 10,
        }
    }
}

impl SmbStatusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Downward-API file carrying samba-image / samba-version / ctdb-version annotations.
    pub pod_info_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_file(&path),
            Err(_) if !std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(_) => Self::load_from_file(DEFAULT_CONFIG_FILE),
        }
    }

    fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.server.metrics_path.starts_with('/'),
            "server.metrics_path must start with '/', got {:?}",
            self.server.metrics_path
        );
        anyhow::ensure!(
            !matches!(self.server.metrics_path.as_str(), "/" | "/version"),
            "server.metrics_path must not shadow a built-in route, got {:?}",
            self.server.metrics_path
        );
        anyhow::ensure!(
            is_literal_route(&self.server.metrics_path),
            "server.metrics_path must be a literal path without captures or wildcards, got {:?}",
            self.server.metrics_path
        );
        anyhow::ensure!(
            self.smbstatus.timeout_secs > 0,
            "smbstatus.timeout_secs must be > 0, got {}",
            self.smbstatus.timeout_secs
        );
        if let Some(path) = &self.smbstatus.path {
            anyhow::ensure!(
                !path.as_os_str().is_empty(),
                "smbstatus.path must be non-empty when set"
            );
        }
        if let Some(path) = &self.cluster.pod_info_path {
            anyhow::ensure!(
                !path.as_os_str().is_empty(),
                "cluster.pod_info_path must be non-empty when set"
            );
        }
        Ok(())
    }
}

/// True when axum would treat `path` as a plain route rather than a capture or wildcard.
fn is_literal_route(path: &str) -> bool {
    !path.contains(['{', '}'])
        && !path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}
