// Version resolution: tool version, cluster metadata, partial failure

mod common;

use common::{FakeTool, VERSION_OUTPUT, failing_tool, healthy_tool};
use smbmetrics::error::StatusError;
use smbmetrics::versions::*;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

struct StaticCluster(HashMap<String, String>);

impl ClusterMetadata for StaticCluster {
    fn component_versions(&self) -> anyhow::Result<HashMap<String, String>> {
        Ok(self.0.clone())
    }
}

struct BrokenCluster;

impl ClusterMetadata for BrokenCluster {
    fn component_versions(&self) -> anyhow::Result<HashMap<String, String>> {
        anyhow::bail!("api server unreachable")
    }
}

fn build() -> BuildInfo {
    BuildInfo {
        version: "v1.2.3".into(),
        commit_id: "deadbeef".into(),
    }
}

#[test]
fn tool_version_strips_prefix() {
    let resolver = VersionResolver::new(Arc::new(healthy_tool()), None, build());
    assert_eq!(resolver.tool_version().unwrap(), "4.19.5");
}

#[test]
fn tool_version_rejects_unexpected_output() {
    let tool = FakeTool::new().with_output(&["-V"], "smbstatus: unknown option\n");
    let resolver = VersionResolver::new(Arc::new(tool), None, build());
    assert!(matches!(
        resolver.tool_version(),
        Err(StatusError::VersionUnresolvable(_))
    ));

    let tool = FakeTool::new().with_output(&["-V"], "");
    let resolver = VersionResolver::new(Arc::new(tool), None, build());
    assert!(matches!(
        resolver.tool_version(),
        Err(StatusError::VersionUnresolvable(_))
    ));
}

#[test]
fn resolve_without_cluster_uses_tool_version() {
    let resolver = VersionResolver::new(Arc::new(healthy_tool()), None, build());
    let resolved = resolver.resolve();
    assert_eq!(resolved.status(), 0);
    assert_eq!(resolved.info.version, "v1.2.3");
    assert_eq!(resolved.info.commit_id, "deadbeef");
    assert_eq!(resolved.info.tool_version, "4.19.5");
    assert_eq!(resolved.info.samba_version, "4.19.5");
    assert!(resolved.info.samba_image.is_empty());
    assert!(resolved.info.ctdb_version.is_empty());
}

#[test]
fn resolve_prefers_cluster_component_versions() {
    let cluster = StaticCluster(HashMap::from([
        (SAMBA_IMAGE_KEY.to_string(), "quay.io/samba.org/samba-server:v0.5".to_string()),
        (SAMBA_VERSION_KEY.to_string(), "4.19.5-1.fc39".to_string()),
        (CTDB_VERSION_KEY.to_string(), "4.19.5".to_string()),
    ]));
    let resolver = VersionResolver::new(Arc::new(healthy_tool()), Some(Arc::new(cluster)), build());
    let info = resolver.resolve().info;
    assert_eq!(info.samba_image, "quay.io/samba.org/samba-server:v0.5");
    assert_eq!(info.samba_version, "4.19.5-1.fc39");
    assert_eq!(info.ctdb_version, "4.19.5");
    assert_eq!(info.tool_version, "4.19.5");
}

#[test]
fn cluster_failure_does_not_fail_resolution() {
    let resolver = VersionResolver::new(
        Arc::new(healthy_tool()),
        Some(Arc::new(BrokenCluster)),
        build(),
    );
    let resolved = resolver.resolve();
    assert_eq!(resolved.status(), 0);
    assert!(resolved.info.samba_image.is_empty());
    assert_eq!(resolved.info.samba_version, "4.19.5");
}

#[test]
fn tool_failure_keeps_best_effort_fields() {
    let cluster = StaticCluster(HashMap::from([(
        SAMBA_IMAGE_KEY.to_string(),
        "samba-server:latest".to_string(),
    )]));
    let resolver = VersionResolver::new(Arc::new(failing_tool()), Some(Arc::new(cluster)), build());
    let resolved = resolver.resolve();
    assert_eq!(resolved.status(), 1);
    assert!(matches!(
        resolved.tool_error,
        Some(StatusError::InvocationFailed(_))
    ));
    assert_eq!(resolved.info.version, "v1.2.3");
    assert_eq!(resolved.info.samba_image, "samba-server:latest");
    assert!(resolved.info.tool_version.is_empty());
}

#[test]
fn every_resolve_queries_the_tool_again() {
    let tool = Arc::new(FakeTool::new().with_output(&["-V"], VERSION_OUTPUT));
    let resolver = VersionResolver::new(tool.clone(), None, build());
    resolver.resolve();
    resolver.resolve();
    assert_eq!(tool.calls().len(), 2);
}

#[test]
fn pod_info_parsing_strips_prefixes_and_quotes() {
    let parsed = parse_pod_info(
        "example.com/samba-image=\"quay.io/samba.org/samba-server:latest\"\n\
         ctdb-version=\"4.19.5\"\n\
         not a pair\n",
    );
    assert_eq!(
        parsed.get(SAMBA_IMAGE_KEY).map(String::as_str),
        Some("quay.io/samba.org/samba-server:latest")
    );
    assert_eq!(parsed.get(CTDB_VERSION_KEY).map(String::as_str), Some("4.19.5"));
    assert_eq!(parsed.len(), 2);
}

#[test]
fn pod_info_file_reads_downward_api_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "smb.example/samba-version=\"4.20.1\"").unwrap();
    let source = PodInfoFile::new(file.path());
    let versions = source.component_versions().unwrap();
    assert_eq!(
        versions.get(SAMBA_VERSION_KEY).map(String::as_str),
        Some("4.20.1")
    );
}

#[test]
fn pod_info_file_missing_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let source = PodInfoFile::new(dir.path().join("annotations"));
    assert!(source.component_versions().is_err());
}

#[test]
fn single_resolve_runs_version_query_once() {
    let tool = Arc::new(FakeTool::new().with_output(&["-V"], VERSION_OUTPUT));
    let resolver = VersionResolver::new(tool.clone(), None, build());
    let resolved = resolver.resolve();
    assert!(resolved.tool_error.is_none());
    assert_eq!(resolved.info.tool_version, "4.19.5");
    assert_eq!(tool.calls(), vec![vec!["-V".to_string()]]);
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn pod_identity_from_downward_api_env() {
    let env = env_of(&[("POD_NAME", "smb-server-0"), ("POD_NAMESPACE", "storage")]);
    assert_eq!(pod_identity(env).as_deref(), Some("storage/smb-server-0"));
}

#[test]
fn pod_identity_falls_back_to_hostname() {
    let env = env_of(&[("HOSTNAME", "smb-server-1"), ("POD_NAME", "")]);
    assert_eq!(pod_identity(env).as_deref(), Some("smb-server-1"));
    assert_eq!(pod_identity(env_of(&[])), None);
}
