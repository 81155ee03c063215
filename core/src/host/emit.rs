//! JSON-lines host adapter
//!
//! Emits every capability call as one JSON object per line for the real host
//! process to pick up and execute, e.g.
//!
//! ```text
//! {"capability":"openDocument","params":{"path":"/tmp/a.py","options":{"preview":true}},"at":"2026-10-16T09:12:03.114Z"}
//! ```

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use super::{
    DocumentOptions, FocusTarget, Host, HostCall, HostError, PanelKind, Position, TerminalId,
    TerminalOptions,
};

pub struct JsonLinesHost<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesHost<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesHost<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn emit(&self, call: HostCall) -> Result<(), HostError> {
        let mut record = serde_json::to_value(&call)
            .map_err(|e| HostError::new(format!("cannot encode {}: {}", call.capability(), e)))?;
        if let Value::Object(map) = &mut record {
            map.insert(
                "at".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }

        let mut line = record.to_string();
        line.push('\n');

        let mut writer = self.writer.lock();
        let written = match writer.write_all(line.as_bytes()) {
            Ok(()) => writer.flush(),
            Err(e) => Err(e),
        };
        written.map_err(|e| HostError::new(format!("cannot emit {}: {}", call.capability(), e)))
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> Host for JsonLinesHost<W> {
    async fn create_terminal(&self, opts: TerminalOptions) -> Result<TerminalId, HostError> {
        let terminal = TerminalId(uuid::Uuid::new_v4().to_string());
        self.emit(HostCall::CreateTerminal {
            terminal: terminal.clone(),
            options: opts,
        })?;
        Ok(terminal)
    }

    async fn send_text(&self, terminal: &TerminalId, text: &str) -> Result<(), HostError> {
        self.emit(HostCall::SendText {
            terminal: terminal.clone(),
            text: text.to_string(),
        })
    }

    async fn show_panel(&self, panel: PanelKind) -> Result<(), HostError> {
        self.emit(HostCall::ShowPanel { panel })
    }

    async fn focus_region(&self, region: FocusTarget) -> Result<(), HostError> {
        self.emit(HostCall::FocusRegion { region })
    }

    async fn open_document(&self, path: &Path, opts: DocumentOptions) -> Result<(), HostError> {
        self.emit(HostCall::OpenDocument {
            path: path.to_path_buf(),
            options: opts,
        })
    }

    async fn set_caret(&self, position: Position) -> Result<(), HostError> {
        self.emit(HostCall::SetCaret { position })
    }

    async fn reveal_position(&self, position: Position) -> Result<(), HostError> {
        self.emit(HostCall::RevealPosition { position })
    }

    async fn invoke(&self, capability: &str, args: Vec<Value>) -> Result<(), HostError> {
        self.emit(HostCall::Invoke {
            name: capability.to_string(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn emitted(host: JsonLinesHost<Vec<u8>>) -> Vec<Value> {
        let bytes = host.into_inner();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_line_per_call() {
        let host = JsonLinesHost::new(Vec::new());
        host.focus_region(FocusTarget::Sidebar).await.unwrap();
        host.invoke("workbench.action.files.save", vec![]).await.unwrap();

        let lines = emitted(host);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["capability"], "focusRegion");
        assert_eq!(lines[0]["params"], json!({"region": "sidebar"}));
        assert_eq!(lines[1]["params"]["name"], "workbench.action.files.save");
        assert!(lines[1]["at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_terminal_id_is_carried_into_send_text() {
        let host = JsonLinesHost::new(Vec::new());
        let id = host
            .create_terminal(TerminalOptions {
                name: Some("build".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        host.send_text(&id, "cargo build").await.unwrap();

        let lines = emitted(host);
        assert_eq!(lines[0]["params"]["terminal"], json!(id.0));
        assert_eq!(lines[0]["params"]["options"], json!({"name": "build"}));
        assert_eq!(lines[1]["params"]["terminal"], json!(id.0));
        assert_eq!(lines[1]["params"]["text"], "cargo build");
    }
}
