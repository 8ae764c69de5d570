// Shared test helpers: scripted smbstatus stand-in and sample reports
#![allow(dead_code)]

use smbmetrics::error::StatusError;
use smbmetrics::smbstatus::{StatusTool, ToolOutput};
use std::collections::HashMap;
use std::sync::Mutex;

pub const FULL_REPORT: &str = r#"
Samba version 4.19.5
PID     Username     Group        Machine                                   Protocol Version  Encryption           Signing
----------------------------------------------------------------------------------------------------------------------------------------
1201    alice        users        10.0.0.5 (ipv4:10.0.0.5:50312)            SMB3_11           -                    partial(AES-128-CMAC)
1202    bob          users        10.0.0.6 (ipv4:10.0.0.6:50400)            SMB3_11           -                    partial(AES-128-CMAC)
1203    alice        users        10.0.0.7 (ipv4:10.0.0.7:50500)            SMB3_02           -                    -

Service      pid     Machine       Connected at                     Encryption   Signing
---------------------------------------------------------------------------------------------
shareA       1201    10.0.0.5      Tue Oct 17 10:00:00 AM 2023 UTC  -            -
shareA       1202    10.0.0.6      Tue Oct 17 10:01:00 AM 2023 UTC  -            -
shareB       1201    10.0.0.5      Tue Oct 17 10:02:00 AM 2023 UTC  -            -
IPC$         1203    10.0.0.7      Tue Oct 17 10:03:00 AM 2023 UTC  -            -

Locked files:
Pid          User(ID)   DenyMode   Access      R/W        Oplock           SharePath   Name   Time
--------------------------------------------------------------------------------------------------
1201         1000       DENY_NONE  0x120089    RDONLY     LEASE(RWH)       /srv/shareA   notes.txt   Tue Oct 17 10:05:00 2023
1202         1001       DENY_NONE  0x12019f    RDWR       LEASE(RWH)       /srv/shareA   notes.txt   Tue Oct 17 10:06:00 2023
1201         1000       DENY_WRITE 0x12019f    RDWR       NONE             /srv/shareB   data/report.xlsx   Tue Oct 17 10:07:00 2023
1203         1002       DENY_NONE  0x120089    RDONLY     NONE             /srv/shareA   readme.md   Tue Oct 17 10:08:00 2023

"#;

pub const EMPTY_REPORT: &str = r#"
Samba version 4.19.5
PID     Username     Group        Machine                                   Protocol Version  Encryption           Signing
----------------------------------------------------------------------------------------------------------------------------------------

Service      pid     Machine       Connected at                     Encryption   Signing
---------------------------------------------------------------------------------------------

No locked files

"#;

pub const BYTE_RANGE_REPORT: &str = r#"
Byte range locks:
Pid        dev:inode       R/W  start     size      SharePath               Name
--------------------------------------------------------------------------------
1202       fd00:2621:0     W    0         100       /srv/shareA             notes.txt
1201       fd00:2622:0     R    4096      512       /srv/shareB             data/report.xlsx
"#;

pub const VERSION_OUTPUT: &str = "Version 4.19.5\n";

/// StatusTool that answers from a table keyed by argument list and records every call.
#[derive(Default)]
pub struct FakeTool {
    responses: HashMap<Vec<String>, Result<ToolOutput, StatusError>>,
    calls: Mutex<Vec<Vec<String>>>,
}

fn key(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, args: &[&str], stdout: &str) -> Self {
        self.responses.insert(
            key(args),
            Ok(ToolOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
            }),
        );
        self
    }

    pub fn with_exit(mut self, args: &[&str], code: i32) -> Self {
        self.responses.insert(
            key(args),
            Ok(ToolOutput {
                stdout: String::new(),
                stderr: "smbstatus: connection refused".to_string(),
                exit_code: Some(code),
            }),
        );
        self
    }

    pub fn with_error(mut self, args: &[&str], err: StatusError) -> Self {
        self.responses.insert(key(args), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl StatusTool for FakeTool {
    fn run(&self, args: &[&str]) -> Result<ToolOutput, StatusError> {
        self.calls.lock().unwrap().push(key(args));
        self.responses.get(&key(args)).cloned().unwrap_or_else(|| {
            Err(StatusError::InvocationFailed(format!(
                "no scripted response for {:?}",
                args
            )))
        })
    }
}

/// Full report, byte-range report and version all succeed.
pub fn healthy_tool() -> FakeTool {
    FakeTool::new()
        .with_output(&[], FULL_REPORT)
        .with_output(&["-B"], BYTE_RANGE_REPORT)
        .with_output(&["-V"], VERSION_OUTPUT)
}

/// Every invocation exits non-zero, as when smbd is down.
pub fn failing_tool() -> FakeTool {
    FakeTool::new()
        .with_exit(&[], 1)
        .with_exit(&["-B"], 1)
        .with_exit(&["-V"], 1)
}

/// The line of `text` for an exact metric (name plus optional label block).
pub fn metric_line<'a>(text: &'a str, series: &str) -> Option<&'a str> {
    text.lines().find(|l| {
        l.strip_prefix(series)
            .is_some_and(|rest| rest.starts_with(' '))
    })
}

/// Parsed value of an exact series in rendered exposition text.
pub fn metric_value(text: &str, series: &str) -> Option<f64> {
    metric_line(text, series)?
        .rsplit(' ')
        .next()?
        .parse()
        .ok()
}
