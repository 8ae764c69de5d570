use anyhow::Result;
use smbmetrics::collectors::{build_registry, default_collectors};
use smbmetrics::smbstatus::{SmbStatus, StatusTool, locate_smbstatus};
use smbmetrics::versions::{
    BuildInfo, ClusterMetadata, PodInfoFile, VersionResolver, pod_identity,
};
use smbmetrics::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!(
        program = %std::env::args().next().unwrap_or_default(),
        version = version::VERSION,
        commit = version::COMMIT_ID,
        "Initializing smbmetrics"
    );

    let app_config = config::AppConfig::load()?;

    // Startup-only fatal checks: the tool must exist and report its version.
    let smbstatus_path = locate_smbstatus(app_config.smbstatus.path.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "Failed to locate smbstatus");
        e
    })?;
    let tool: Arc<dyn StatusTool> = Arc::new(SmbStatus::new(
        smbstatus_path.clone(),
        app_config.smbstatus.timeout(),
        tokio::runtime::Handle::current(),
    ));
    let cluster = app_config
        .cluster
        .pod_info_path
        .clone()
        .map(|path| Arc::new(PodInfoFile::new(path)) as Arc<dyn ClusterMetadata>);
    let resolver = Arc::new(VersionResolver::new(
        tool.clone(),
        cluster,
        BuildInfo::current(),
    ));

    let startup_resolver = resolver.clone();
    let versions = tokio::task::spawn_blocking(move || startup_resolver.resolve()).await?;
    if let Some(e) = versions.tool_error {
        tracing::error!(error = %e, "Failed to run smbstatus");
        return Err(e.into());
    }
    tracing::info!(
        path = %smbstatus_path.display(),
        version = %versions.info.tool_version,
        "Located smbstatus"
    );
    tracing::info!(
        pod = %pod_identity(|key| std::env::var(key).ok()).unwrap_or_default(),
        versions = ?versions.info,
        "Versions"
    );

    let registry = build_registry(default_collectors(tool, resolver)?).map_err(|e| {
        tracing::error!(error = %e, "failed to register collectors");
        e
    })?;

    let app = routes::app(registry, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "Serving metrics on http://{}{}",
        addr,
        app_config.server.metrics_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Received shutdown signal");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
