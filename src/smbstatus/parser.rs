// Parse smbstatus text output (process table, shares table, locked files, byte-range locks).

use std::collections::{HashMap, HashSet};

use super::ToolOutput;
use crate::error::StatusError;
use crate::models::{
    AccessMode, ByteRangeLock, FileOpen, LockKind, OpenFile, Session, Share, StatusSnapshot,
    TreeConnection,
};

/// Tokens in the asctime stamp (`Tue Oct 17 10:00:00 2023`) ending a locked-file row.
const LOCKED_FILE_TIME_TOKENS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    /// Header offsets of the Group and Machine columns, used when names contain spaces.
    Sessions {
        group_col: Option<usize>,
        machine_col: Option<usize>,
    },
    /// `trailing` is how many single-token columns (Encryption, Signing) follow "Connected at".
    Shares { trailing: usize },
    LockedFiles,
    ByteRangeLocks,
}

/// Turn one invocation into a snapshot. A non-zero exit is an invocation failure,
/// regardless of what was printed.
pub fn snapshot_from_output(output: &ToolOutput) -> Result<StatusSnapshot, StatusError> {
    if !output.success() {
        let detail = output.stderr.trim();
        return Err(StatusError::InvocationFailed(match output.exit_code {
            Some(code) if detail.is_empty() => format!("exit status {}", code),
            Some(code) => format!("exit status {}: {}", code, detail),
            None => "terminated by signal".to_string(),
        }));
    }
    parse_status(&output.stdout)
}

/// Parse the text report. Missing sections are empty; output that contains text but
/// no recognisable section at all is malformed.
pub fn parse_status(text: &str) -> Result<StatusSnapshot, StatusError> {
    let mut builder = SnapshotBuilder::default();
    let mut section = Section::None;
    let mut saw_section = false;
    let mut first_content_line = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || is_separator(line) {
            continue;
        }
        if let Some(version) = line.strip_prefix("Samba version ") {
            builder.samba_version = Some(version.trim().to_string());
            continue;
        }
        first_content_line.get_or_insert(line_no);

        if let Some(next) = section_header(line) {
            section = next;
            saw_section = true;
            continue;
        }
        if is_empty_marker(line) {
            section = Section::None;
            saw_section = true;
            continue;
        }

        match section {
            // Stray text between tables (warnings and the like).
            Section::None => {}
            Section::Sessions {
                group_col,
                machine_col,
            } => builder
                .sessions
                .push(parse_session(line, line_no, group_col, machine_col)?),
            Section::Shares { trailing } => {
                builder.add_tree_connection(parse_tree_connection(line, line_no, trailing)?)
            }
            Section::LockedFiles => {
                if !is_column_header(line) {
                    let (share_path, name, open) = parse_locked_file(line, line_no)?;
                    builder.add_open(share_path, name, open);
                }
            }
            Section::ByteRangeLocks => {
                if !is_column_header(line) {
                    builder.locks.push(parse_byte_range_lock(line, line_no)?);
                }
            }
        }
    }

    if let Some(line) = first_content_line
        && !saw_section
    {
        return Err(StatusError::malformed(line, "no status sections found"));
    }
    Ok(builder.build())
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| c == '-')
}

fn section_header(line: &str) -> Option<Section> {
    if line.starts_with("PID") && line.contains("Username") {
        return Some(Section::Sessions {
            group_col: line.find("Group"),
            machine_col: line.find("Machine"),
        });
    }
    if line.starts_with("Service") && line.contains("Machine") {
        let trailing = ["Encryption", "Signing"]
            .iter()
            .filter(|col| line.contains(*col))
            .count();
        return Some(Section::Shares { trailing });
    }
    if line.starts_with("Locked files") {
        return Some(Section::LockedFiles);
    }
    if line.starts_with("Byte range locks") {
        return Some(Section::ByteRangeLocks);
    }
    None
}

fn is_empty_marker(line: &str) -> bool {
    line.starts_with("No locked files") || line.starts_with("No byte range locks")
}

/// Column header under "Locked files:" and "Byte range locks:".
fn is_column_header(line: &str) -> bool {
    line.starts_with("Pid")
}

/// Session rows: `pid user group machine (address) [protocol encryption signing]`.
///
/// User and group names may contain spaces. The machine is located by the
/// parenthesised address after it (or the header's Machine column), and the
/// user/group boundary by the header's Group column. A row whose names cannot be
/// separated that way is malformed rather than silently shifted.
fn parse_session(
    line: &str,
    line_no: usize,
    group_col: Option<usize>,
    machine_col: Option<usize>,
) -> Result<Session, StatusError> {
    let tokens = tokens_with_offsets(line);
    if tokens.len() < 4 {
        return Err(StatusError::malformed(
            line_no,
            format!("session row has {} columns, expected at least 4", tokens.len()),
        ));
    }
    let machine_idx = tokens
        .iter()
        .skip(4)
        .position(|(_, t)| t.starts_with('('))
        .map(|p| p + 3)
        .or_else(|| {
            let col = machine_col?;
            tokens.iter().skip(3).position(|(off, _)| *off == col).map(|p| p + 3)
        })
        .unwrap_or(3);

    let names = &tokens[1..machine_idx];
    let machine_start = tokens[machine_idx].0;
    let (username, group) = if names.len() == 2 {
        (names[0].1.to_string(), names[1].1.to_string())
    } else {
        let split = group_col
            .and_then(|col| names.iter().skip(1).find(|(off, _)| *off == col))
            .map(|(off, _)| *off)
            .ok_or_else(|| {
                StatusError::malformed(line_no, "cannot separate username and group columns")
            })?;
        (
            line[names[0].0..split].trim().to_string(),
            line[split..machine_start].trim().to_string(),
        )
    };

    let after: Vec<&str> = tokens[machine_idx + 1..].iter().map(|(_, t)| *t).collect();
    let (remote_address, consumed) = parenthesised(&after);
    let mut rest = after[consumed..].iter().map(|t| t.to_string());
    Ok(Session {
        session_id: tokens[0].1.to_string(),
        username,
        group,
        machine: tokens[machine_idx].1.to_string(),
        remote_address,
        protocol: rest.next(),
        encryption: rest.next(),
        signing: rest.next(),
    })
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens_with_offsets(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}

/// Collect a leading `(...)` group that may span several tokens.
/// Returns the inner text and how many tokens it used.
fn parenthesised(tokens: &[&str]) -> (Option<String>, usize) {
    match tokens.first() {
        Some(first) if first.starts_with('(') => {
            let end = tokens
                .iter()
                .position(|t| t.ends_with(')'))
                .unwrap_or(tokens.len() - 1);
            let joined = tokens[..=end].join(" ");
            let inner = joined.trim_start_matches('(').trim_end_matches(')');
            (Some(inner.to_string()), end + 1)
        }
        _ => (None, 0),
    }
}

fn parse_tree_connection(
    line: &str,
    line_no: usize,
    trailing: usize,
) -> Result<TreeConnection, StatusError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(StatusError::malformed(
            line_no,
            format!("share row has {} columns, expected at least 3", tokens.len()),
        ));
    }
    let rest = &tokens[3..];
    let connected = if rest.len() > trailing {
        &rest[..rest.len() - trailing]
    } else {
        rest
    };
    Ok(TreeConnection {
        service: tokens[0].to_string(),
        server_id: tokens[1].to_string(),
        machine: tokens[2].to_string(),
        connected_at: connected.join(" "),
    })
}

fn parse_locked_file(line: &str, line_no: usize) -> Result<(String, String, FileOpen), StatusError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 8 {
        return Err(StatusError::malformed(
            line_no,
            format!("locked file row has {} columns, expected at least 8", tokens.len()),
        ));
    }
    let access_mask = parse_hex(tokens[3]).ok_or_else(|| {
        StatusError::malformed(line_no, format!("invalid access mask {:?}", tokens[3]))
    })?;
    let rest = &tokens[7..];
    let name = if rest.len() > LOCKED_FILE_TIME_TOKENS {
        rest[..rest.len() - LOCKED_FILE_TIME_TOKENS].join(" ")
    } else {
        rest[0].to_string()
    };
    let open = FileOpen {
        pid: tokens[0].to_string(),
        uid: tokens[1].to_string(),
        deny_mode: tokens[2].to_string(),
        access_mask,
        access: AccessMode::from_column(tokens[4]),
        oplock: tokens[5].to_string(),
    };
    Ok((tokens[6].to_string(), name, open))
}

fn parse_byte_range_lock(line: &str, line_no: usize) -> Result<ByteRangeLock, StatusError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 7 {
        return Err(StatusError::malformed(
            line_no,
            format!("byte range lock row has {} columns, expected at least 7", tokens.len()),
        ));
    }
    let number = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| StatusError::malformed(line_no, format!("invalid lock offset {:?}", s)))
    };
    Ok(ByteRangeLock {
        pid: tokens[0].to_string(),
        dev_inode: tokens[1].to_string(),
        kind: LockKind::from(tokens[2]),
        start: number(tokens[3])?,
        size: number(tokens[4])?,
        share_path: tokens[5].to_string(),
        name: tokens[6..].join(" "),
    })
}

fn parse_hex(s: &str) -> Option<u32> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).ok()
}

#[derive(Default)]
struct SnapshotBuilder {
    samba_version: Option<String>,
    sessions: Vec<Session>,
    tree_connections: Vec<TreeConnection>,
    shares: Vec<Share>,
    seen_shares: HashSet<(String, String)>,
    open_files: Vec<OpenFile>,
    open_file_index: HashMap<(String, String), usize>,
    locks: Vec<ByteRangeLock>,
}

impl SnapshotBuilder {
    fn add_tree_connection(&mut self, tcon: TreeConnection) {
        let key = (tcon.service.clone(), tcon.server_id.clone());
        if self.seen_shares.insert(key) {
            self.shares.push(Share {
                name: tcon.service.clone(),
                server_id: tcon.server_id.clone(),
            });
        }
        self.tree_connections.push(tcon);
    }

    fn add_open(&mut self, share_path: String, name: String, open: FileOpen) {
        let key = (share_path, name);
        match self.open_file_index.get(&key) {
            Some(&i) => self.open_files[i].opens.push(open),
            None => {
                self.open_file_index.insert(key.clone(), self.open_files.len());
                let (share_path, name) = key;
                self.open_files.push(OpenFile {
                    share_path,
                    name,
                    opens: vec![open],
                });
            }
        }
    }

    fn build(self) -> StatusSnapshot {
        StatusSnapshot {
            samba_version: self.samba_version,
            sessions: self.sessions,
            tree_connections: self.tree_connections,
            shares: self.shares,
            open_files: self.open_files,
            locks: self.locks,
        }
    }
}
