//! Shared fakes for exercising the orchestration seams in tests.

use std::cell::RefCell;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::exec::{ToolInvocation, ToolOutput, ToolRunner};
use crate::fetch::Fetcher;
use crate::types::ForgeError;

/// Chronological log shared between fakes so cross-component ordering can be
/// asserted.
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Scripted tool runner that records every invocation.
///
/// Results are consumed front-first from the script; once the script is
/// empty, every invocation succeeds with empty output.
pub struct RecordingRunner {
    pub log: EventLog,
    pub invocations: RefCell<Vec<ToolInvocation>>,
    script: RefCell<Vec<Result<ToolOutput, ForgeError>>>,
}

impl RecordingRunner {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            invocations: RefCell::new(Vec::new()),
            script: RefCell::new(Vec::new()),
        }
    }

    pub fn push_result(&self, result: Result<ToolOutput, ForgeError>) {
        self.script.borrow_mut().push(result);
    }

    pub fn tool_failure(output: &str) -> ForgeError {
        ForgeError::Tool {
            command: "scripted".into(),
            output: output.into(),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(ToolInvocation::display)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.invocations.borrow().len()
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ForgeError> {
        self.log.borrow_mut().push(format!("run {}", invocation.display()));
        self.invocations.borrow_mut().push(invocation.clone());
        let mut script = self.script.borrow_mut();
        if script.is_empty() {
            Ok(ToolOutput::default())
        } else {
            script.remove(0)
        }
    }
}

/// Fetcher that materializes a prepared archive, or fails with a canned
/// network error when no payload was supplied.
pub struct StubFetcher {
    pub log: EventLog,
    pub calls: RefCell<usize>,
    payload: Option<Vec<u8>>,
}

impl StubFetcher {
    pub fn serving(log: EventLog, payload: Vec<u8>) -> Self {
        Self {
            log,
            calls: RefCell::new(0),
            payload: Some(payload),
        }
    }

    pub fn unreachable(log: EventLog) -> Self {
        Self {
            log,
            calls: RefCell::new(0),
            payload: None,
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }
}

impl Fetcher for StubFetcher {
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ForgeError> {
        self.log.borrow_mut().push(format!("download {url}"));
        *self.calls.borrow_mut() += 1;
        match &self.payload {
            Some(bytes) => {
                fs::create_dir_all(dest_dir)?;
                let name = url.rsplit('/').next().unwrap_or("archive.zip");
                let dest = dest_dir.join(name);
                fs::write(&dest, bytes)?;
                Ok(dest)
            }
            None => Err(ForgeError::Network(format!("requesting {url}: connection refused"))),
        }
    }
}

/// Builds an SDK tools archive in memory containing the given entries.
pub fn sdk_archive(entries: &[&str]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        for name in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(b"#!/bin/sh\n").unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}
