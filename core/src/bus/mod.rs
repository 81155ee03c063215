//! The command bus
//!
//! Turns the shared command file into dispatched commands:
//!
//! ```text
//! producers --append--> command file --drain--> parse --> dispatch --> host
//! ```
//!
//! # Drains
//!
//! A drain reads the whole file, truncates it, then processes the lines in
//! file order. Watch notifications and manual drains share one lock around
//! that whole sequence, so a line is consumed at most once and batches never
//! interleave. A failing line is logged and reported; the rest of the batch
//! still runs.

pub mod inbox;
pub mod lifecycle;
pub mod watcher;

pub use inbox::CommandInbox;
pub use lifecycle::BusLifecycle;
pub use watcher::WatchHandle;

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::config::BusConfig;
use crate::dispatch::Dispatcher;
use crate::error::BusError;
use crate::follow_up::FollowUps;
use crate::handlers::Outcome;
use crate::host::Host;
use crate::parser::parse_line;

/// A line of a batch that did not make it through
#[derive(Debug)]
pub struct LineFailure {
    /// One-indexed within the batch
    pub line_no: usize,
    /// Uppercased command name of the line
    pub command: String,
    pub error: BusError,
}

/// What a single drain did
#[derive(Debug, Default)]
pub struct DrainReport {
    pub lines_read: usize,
    pub skipped_blank: usize,
    pub dispatched: usize,
    pub failures: Vec<LineFailure>,
}

impl DrainReport {
    /// Nothing was in the file
    pub fn is_empty(&self) -> bool {
        self.lines_read == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} line(s): {} dispatched, {} failed, {} blank",
            self.lines_read,
            self.dispatched,
            self.failures.len(),
            self.skipped_blank
        )
    }
}

pub struct CommandBus {
    dispatcher: Dispatcher,
    inbox: RwLock<CommandInbox>,
    drain_lock: Mutex<()>,
}

impl CommandBus {
    pub fn new(command_file: impl Into<PathBuf>, host: Arc<dyn Host>) -> Self {
        Self {
            dispatcher: Dispatcher::new(host),
            inbox: RwLock::new(CommandInbox::new(command_file)),
            drain_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &BusConfig, host: Arc<dyn Host>) -> Self {
        let bus = Self::new(config.command_file.clone(), host);
        bus.dispatcher.set_follow_up_delay(config.follow_up_delay());
        bus
    }

    pub fn command_file(&self) -> PathBuf {
        self.inbox.read().path().to_path_buf()
    }

    /// Point the bus at another command file. Takes effect from the next drain.
    pub fn retarget(&self, command_file: impl Into<PathBuf>) {
        *self.inbox.write() = CommandInbox::new(command_file);
    }

    pub fn ensure_inbox(&self) -> Result<(), BusError> {
        self.inbox.read().ensure_exists()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn follow_ups(&self) -> &FollowUps {
        self.dispatcher.follow_ups()
    }

    /// One read-truncate-process pass over the command file
    pub async fn drain(&self) -> Result<DrainReport, BusError> {
        let _guard = self.drain_lock.lock().await;
        let inbox = self.inbox.read().clone();

        let Some(text) = inbox.take().await? else {
            trace!(path = %inbox.path().display(), "command file empty");
            return Ok(DrainReport::default());
        };

        let report = self.run_batch(&text).await;
        info!(
            path = %inbox.path().display(),
            dispatched = report.dispatched,
            failed = report.failures.len(),
            "drained command file"
        );
        Ok(report)
    }

    /// Dispatch an already-read batch line by line. Does not touch the
    /// command file and does not take the drain lock.
    pub async fn run_batch(&self, text: &str) -> DrainReport {
        let mut report = DrainReport::default();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            report.lines_read += 1;

            let command = match parse_line(line) {
                None => {
                    report.skipped_blank += 1;
                    continue;
                }
                Some(Ok(command)) => command,
                Some(Err(err)) => {
                    let command = err.command().unwrap_or_default().to_string();
                    warn!(
                        line_no,
                        command = %command,
                        line = %line.trim(),
                        error = %err,
                        "skipping malformed command"
                    );
                    report.failures.push(LineFailure {
                        line_no,
                        command,
                        error: err,
                    });
                    continue;
                }
            };

            let name = command.name.clone();
            match self.dispatcher.dispatch(command).await {
                Ok(Outcome::NoOp { reason }) => {
                    debug!(line_no, command = %name, %reason, "command had nothing to do");
                    report.dispatched += 1;
                }
                Ok(outcome) => {
                    debug!(line_no, command = %name, ?outcome, "command dispatched");
                    report.dispatched += 1;
                }
                Err(err) => {
                    error!(line_no, command = %name, error = %err, "command failed");
                    report.failures.push(LineFailure {
                        line_no,
                        command: name,
                        error: err,
                    });
                }
            }
        }

        report
    }
}
