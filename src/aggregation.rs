// Pure aggregation over a StatusSnapshot: scalar totals and service/machine maps.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::models::StatusSnapshot;

/// Share name -> machines, or machine -> share names.
pub type RelationMap = BTreeMap<String, BTreeSet<String>>;

pub fn total_sessions(snapshot: &StatusSnapshot) -> usize {
    snapshot.sessions.len()
}

pub fn total_tree_connections(snapshot: &StatusSnapshot) -> usize {
    snapshot.tree_connections.len()
}

/// Distinct user names across all sessions.
pub fn total_connected_users(snapshot: &StatusSnapshot) -> usize {
    snapshot
        .sessions
        .iter()
        .map(|s| s.username.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn total_open_files(snapshot: &StatusSnapshot) -> usize {
    snapshot.open_files.len()
}

/// Every handle on every open file.
pub fn total_open_file_handles(snapshot: &StatusSnapshot) -> usize {
    snapshot.open_files.iter().map(|f| f.opens.len()).sum()
}

/// Files with at least one read-write handle; never exceeds `total_open_files`.
pub fn total_open_files_access_rw(snapshot: &StatusSnapshot) -> usize {
    snapshot
        .open_files
        .iter()
        .filter(|f| f.has_read_write_open())
        .count()
}

/// Distinct share names being served.
pub fn total_shares(snapshot: &StatusSnapshot) -> usize {
    snapshot
        .shares
        .iter()
        .map(|s| s.name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn total_locks(snapshot: &StatusSnapshot) -> usize {
    snapshot.locks.len()
}

/// For each share, the distinct machines connected to it.
pub fn service_to_machines(snapshot: &StatusSnapshot) -> RelationMap {
    let mut map = RelationMap::new();
    for tcon in &snapshot.tree_connections {
        map.entry(tcon.service.clone())
            .or_default()
            .insert(tcon.machine.clone());
    }
    map
}

/// For each machine, the distinct shares it is connected to.
pub fn machine_to_services(snapshot: &StatusSnapshot) -> RelationMap {
    let mut map = RelationMap::new();
    for tcon in &snapshot.tree_connections {
        map.entry(tcon.machine.clone())
            .or_default()
            .insert(tcon.service.clone());
    }
    map
}

/// The six activity totals exported by the activity collector.
/// `Default` is all zeros, which is what a failed collection reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub sessions: usize,
    pub tree_connections: usize,
    pub connected_users: usize,
    pub open_files: usize,
    pub open_file_handles: usize,
    pub open_files_access_rw: usize,
}

impl Totals {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        Self {
            sessions: total_sessions(snapshot),
            tree_connections: total_tree_connections(snapshot),
            connected_users: total_connected_users(snapshot),
            open_files: total_open_files(snapshot),
            open_file_handles: total_open_file_handles(snapshot),
            open_files_access_rw: total_open_files_access_rw(snapshot),
        }
    }
}
