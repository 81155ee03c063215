//! Producer side of the bus
//!
//! Any process can drive the host by appending lines to the command file;
//! [`BridgeClient`] does that with the right framing. Each record goes out in
//! one append-mode write so concurrent producers never interleave partial
//! lines.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::BusConfig;
use crate::error::BusError;
use crate::parser::Command;
use crate::payload::{DocumentArgs, SessionArgs, TerminalArgs};

#[derive(Debug, Clone)]
pub struct BridgeClient {
    command_file: PathBuf,
}

impl BridgeClient {
    pub fn new(command_file: impl Into<PathBuf>) -> Self {
        Self {
            command_file: command_file.into(),
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(config.command_file.clone())
    }

    pub fn command_file(&self) -> &Path {
        &self.command_file
    }

    /// Append one command record
    pub fn send(&self, command: &Command) -> Result<(), BusError> {
        let line = format!("{}\n", command);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.command_file)
            .map_err(|e| BusError::file_access(&self.command_file, "append to", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| BusError::file_access(&self.command_file, "append to", e))?;
        debug!(command = %command.name, path = %self.command_file.display(), "command sent");
        Ok(())
    }

    /// Append `name` with `payload` serialized as its argument object
    pub fn send_typed<T: Serialize>(&self, name: &str, payload: &T) -> Result<(), BusError> {
        match serde_json::to_value(payload)? {
            Value::Object(map) => self.send(&Command::new(name, Some(map))),
            other => Err(BusError::InvalidArguments {
                command: name.to_uppercase(),
                reason: format!("payload must serialize to a JSON object, got {}", other),
            }),
        }
    }

    pub fn open_session(&self, session: &str, attach: bool) -> Result<(), BusError> {
        self.send_typed(
            "TMUX",
            &SessionArgs {
                session: session.to_string(),
                attach,
            },
        )
    }

    pub fn open_terminal(&self, args: &TerminalArgs) -> Result<(), BusError> {
        self.send_typed("TERMINAL", args)
    }

    pub fn toggle_panel(&self, panel: &str) -> Result<(), BusError> {
        self.send(&Command::new("PANEL", Some(object(json!({ "panel": panel })))))
    }

    pub fn focus(&self, target: &str) -> Result<(), BusError> {
        self.send(&Command::new("FOCUS", Some(object(json!({ "target": target })))))
    }

    pub fn open_file(&self, args: &DocumentArgs) -> Result<(), BusError> {
        self.send_typed("EDITOR", args)
    }

    /// Run a host command by identifier
    pub fn execute(&self, command: &str, args: Vec<Value>) -> Result<(), BusError> {
        let mut payload = Map::new();
        payload.insert("command".to_string(), Value::String(command.to_string()));
        payload.insert("args".to_string(), Value::Array(args));
        self.send(&Command::new("VSCODE", Some(payload)))
    }

    pub fn show_command_palette(&self) -> Result<(), BusError> {
        self.execute("workbench.action.showCommands", Vec::new())
    }

    pub fn toggle_sidebar(&self) -> Result<(), BusError> {
        self.execute("workbench.action.toggleSidebarVisibility", Vec::new())
    }

    pub fn save_file(&self) -> Result<(), BusError> {
        self.execute("workbench.action.files.save", Vec::new())
    }

    pub fn save_all(&self) -> Result<(), BusError> {
        self.execute("workbench.action.files.saveAll", Vec::new())
    }

    pub fn split_editor(&self) -> Result<(), BusError> {
        self.execute("workbench.action.splitEditor", Vec::new())
    }

    /// Run a named task defined in the host's workspace
    pub fn run_task(&self, task: &str) -> Result<(), BusError> {
        self.execute(
            "workbench.action.tasks.runTask",
            vec![Value::String(task.to_string())],
        )
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::CommandBus;
    use crate::host::{FocusTarget, HostCall, PanelKind, Position, RecordingHost};
    use crate::parser::parse_line;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn lines(client: &BridgeClient) -> Vec<String> {
        std::fs::read_to_string(client.command_file())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_framing() {
        let dir = TempDir::new().unwrap();
        let client = BridgeClient::new(dir.path().join("inbox"));

        client.send(&Command::new("ping", None)).unwrap();
        client.open_session("work", false).unwrap();
        client.focus("terminal").unwrap();

        let written = lines(&client);
        assert_eq!(written[0], "PING");
        let tmux = parse_line(&written[1]).unwrap().unwrap();
        assert_eq!(tmux.name, "TMUX");
        assert_eq!(
            Value::Object(tmux.args.unwrap()),
            json!({"session": "work", "attach": false})
        );
        assert_eq!(written[2], r#"FOCUS {"target":"terminal"}"#);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let dir = TempDir::new().unwrap();
        let client = BridgeClient::new(dir.path().join("inbox"));
        client
            .open_terminal(&TerminalArgs {
                command: Some("htop".to_string()),
                ..Default::default()
            })
            .unwrap();

        let written = lines(&client);
        let command = parse_line(&written[0]).unwrap().unwrap();
        let args = command.args.unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args["command"], "htop");
    }

    #[test]
    fn test_appends_after_existing_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inbox");
        std::fs::write(&path, "PANEL\n").unwrap();

        let client = BridgeClient::new(&path);
        client.save_file().unwrap();
        client.toggle_sidebar().unwrap();

        let written = lines(&client);
        assert_eq!(written.len(), 3);
        assert_eq!(written[0], "PANEL");
        assert!(written[1].starts_with("VSCODE "));
        assert!(written[2].contains("workbench.action.toggleSidebarVisibility"));
    }

    #[tokio::test]
    async fn test_named_host_commands() {
        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(RecordingHost::new());
        let bus = CommandBus::new(dir.path().join("inbox"), recorder.clone());
        let client = BridgeClient::new(bus.command_file());

        client.show_command_palette().unwrap();
        client.save_all().unwrap();
        client.split_editor().unwrap();
        client.run_task("test").unwrap();

        let report = bus.drain().await.unwrap();
        assert_eq!(report.dispatched, 4);

        let invoked: Vec<(String, Vec<Value>)> = recorder
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Invoke { name, args } => Some((name, args)),
                _ => None,
            })
            .collect();
        assert_eq!(
            invoked,
            vec![
                ("workbench.action.showCommands".to_string(), vec![]),
                ("workbench.action.files.saveAll".to_string(), vec![]),
                ("workbench.action.splitEditor".to_string(), vec![]),
                ("workbench.action.tasks.runTask".to_string(), vec![json!("test")]),
            ]
        );
    }

    #[tokio::test]
    async fn test_client_records_drive_the_bus() {
        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(RecordingHost::new());
        let bus = CommandBus::new(dir.path().join("inbox"), recorder.clone());
        let client = BridgeClient::new(bus.command_file());

        client.toggle_panel("problems").unwrap();
        client.focus("sidebar").unwrap();
        client
            .open_file(&DocumentArgs {
                file: Some(PathBuf::from("/src/main.rs")),
                line: Some(12),
                ..Default::default()
            })
            .unwrap();
        client
            .execute("workbench.action.tasks.runTask", vec![json!("build")])
            .unwrap();

        let report = bus.drain().await.unwrap();
        assert_eq!(report.dispatched, 4);
        assert!(report.failures.is_empty());

        let calls = recorder.calls();
        assert_eq!(calls[0], HostCall::ShowPanel { panel: PanelKind::Problems });
        assert_eq!(calls[1], HostCall::FocusRegion { region: FocusTarget::Sidebar });
        assert!(matches!(calls[2], HostCall::OpenDocument { .. }));
        assert_eq!(calls[3], HostCall::SetCaret { position: Position::line_start(12) });
        assert_eq!(calls[4], HostCall::RevealPosition { position: Position::line_start(12) });
        assert_eq!(
            calls[5],
            HostCall::Invoke {
                name: "workbench.action.tasks.runTask".to_string(),
                args: vec![json!("build")],
            }
        );
    }
}
