//! Recording host
//!
//! Keeps every capability call in memory instead of performing it. Used for
//! dry runs and as the host double in tests; specific capabilities can be
//! told to fail so error paths can be exercised.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    capability, DocumentOptions, FocusTarget, Host, HostError, PanelKind, Position, TerminalId,
    TerminalOptions,
};

/// One capability invocation as seen by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "capability", content = "params")]
pub enum HostCall {
    #[serde(rename = "createTerminalSurface")]
    CreateTerminal {
        terminal: TerminalId,
        options: TerminalOptions,
    },
    #[serde(rename = "sendText")]
    SendText { terminal: TerminalId, text: String },
    #[serde(rename = "showPanel")]
    ShowPanel { panel: PanelKind },
    #[serde(rename = "focusRegion")]
    FocusRegion { region: FocusTarget },
    #[serde(rename = "openDocument")]
    OpenDocument {
        path: PathBuf,
        options: DocumentOptions,
    },
    #[serde(rename = "setCaret")]
    SetCaret { position: Position },
    #[serde(rename = "revealPosition")]
    RevealPosition { position: Position },
    #[serde(rename = "invoke")]
    Invoke { name: String, args: Vec<Value> },
}

impl HostCall {
    pub fn capability(&self) -> &'static str {
        match self {
            HostCall::CreateTerminal { .. } => capability::CREATE_TERMINAL,
            HostCall::SendText { .. } => capability::SEND_TEXT,
            HostCall::ShowPanel { .. } => capability::SHOW_PANEL,
            HostCall::FocusRegion { .. } => capability::FOCUS_REGION,
            HostCall::OpenDocument { .. } => capability::OPEN_DOCUMENT,
            HostCall::SetCaret { .. } => capability::SET_CARET,
            HostCall::RevealPosition { .. } => capability::REVEAL_POSITION,
            HostCall::Invoke { .. } => capability::INVOKE,
        }
    }
}

#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    failing: Mutex<HashSet<String>>,
    next_terminal: AtomicUsize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to `capability` fail without being recorded
    pub fn fail_on(&self, capability: &str) {
        self.failing.lock().insert(capability.to_string());
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    fn record(&self, call: HostCall) -> Result<(), HostError> {
        let capability = call.capability();
        if self.failing.lock().contains(capability) {
            return Err(HostError::new(format!("{} rejected by host", capability)));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Host for RecordingHost {
    async fn create_terminal(&self, opts: TerminalOptions) -> Result<TerminalId, HostError> {
        let n = self.next_terminal.fetch_add(1, Ordering::Relaxed) + 1;
        let terminal = TerminalId(format!("term-{}", n));
        self.record(HostCall::CreateTerminal {
            terminal: terminal.clone(),
            options: opts,
        })?;
        Ok(terminal)
    }

    async fn send_text(&self, terminal: &TerminalId, text: &str) -> Result<(), HostError> {
        self.record(HostCall::SendText {
            terminal: terminal.clone(),
            text: text.to_string(),
        })
    }

    async fn show_panel(&self, panel: PanelKind) -> Result<(), HostError> {
        self.record(HostCall::ShowPanel { panel })
    }

    async fn focus_region(&self, region: FocusTarget) -> Result<(), HostError> {
        self.record(HostCall::FocusRegion { region })
    }

    async fn open_document(&self, path: &Path, opts: DocumentOptions) -> Result<(), HostError> {
        self.record(HostCall::OpenDocument {
            path: path.to_path_buf(),
            options: opts,
        })
    }

    async fn set_caret(&self, position: Position) -> Result<(), HostError> {
        self.record(HostCall::SetCaret { position })
    }

    async fn reveal_position(&self, position: Position) -> Result<(), HostError> {
        self.record(HostCall::RevealPosition { position })
    }

    async fn invoke(&self, capability: &str, args: Vec<Value>) -> Result<(), HostError> {
        self.record(HostCall::Invoke {
            name: capability.to_string(),
            args,
        })
    }
}
