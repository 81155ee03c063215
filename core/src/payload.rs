//! Typed argument payloads
//!
//! Each known family decodes its JSON object once, at the dispatch boundary.
//! Absent fields take the family's defaults and unknown fields are ignored,
//! so the wire format stays as permissive as before. A known field with the
//! wrong JSON type is an [`BusError::InvalidArguments`] for that line.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BusError;
use crate::host::{FocusTarget, PanelKind};
use crate::parser::Command;
use crate::registry::CommandFamily;

/// A named value that is either one the host knows or passed through as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Known(T),
    Other(String),
}

impl<'de, T: FromStr> Deserialize<'de> for Choice<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.parse::<T>() {
            Ok(known) => Choice::Known(known),
            Err(_) => Choice::Other(raw),
        })
    }
}

impl<T: fmt::Display> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Known(known) => known.fmt(f),
            Choice::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionArgs {
    pub session: String,
    pub attach: bool,
}

impl Default for SessionArgs {
    fn default() -> Self {
        Self {
            session: "default-session".to_string(),
            attach: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Submitted to the new terminal right after creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelArgs {
    pub panel: Choice<PanelKind>,
}

impl Default for PanelArgs {
    fn default() -> Self {
        Self {
            panel: Choice::Known(PanelKind::Terminal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusArgs {
    pub target: Choice<FocusTarget>,
}

impl Default for FocusArgs {
    fn default() -> Self {
        Self {
            target: Choice::Known(FocusTarget::Editor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub preview: bool,
    /// One-indexed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Default for DocumentArgs {
    fn default() -> Self {
        Self {
            file: None,
            column: None,
            preview: true,
            line: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

/// A command with its payload decoded for exactly one handler
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    OpenSession(SessionArgs),
    OpenTerminal(TerminalArgs),
    TogglePanel(PanelArgs),
    RouteFocus(FocusArgs),
    OpenDocument(DocumentArgs),
    Execute(ExecuteArgs),
    /// Unregistered name, forwarded verbatim with the payload as sole argument
    Raw { name: String, args: Vec<Value> },
}

impl Instruction {
    pub fn decode(family: Option<CommandFamily>, command: Command) -> Result<Self, BusError> {
        let Command { name, args } = command;
        let family = match family {
            Some(family) => family,
            None => {
                let args = args.map(Value::Object).into_iter().collect();
                return Ok(Instruction::Raw { name, args });
            }
        };

        Ok(match family {
            CommandFamily::MultiplexerSession => Instruction::OpenSession(typed(&name, args)?),
            CommandFamily::Terminal => Instruction::OpenTerminal(typed(&name, args)?),
            CommandFamily::Panel => Instruction::TogglePanel(typed(&name, args)?),
            CommandFamily::Focus => Instruction::RouteFocus(typed(&name, args)?),
            CommandFamily::Document => Instruction::OpenDocument(typed(&name, args)?),
            CommandFamily::Execute => Instruction::Execute(typed(&name, args)?),
        })
    }
}

fn typed<T: DeserializeOwned + Default>(
    name: &str,
    args: Option<Map<String, Value>>,
) -> Result<T, BusError> {
    match args {
        None => Ok(T::default()),
        Some(map) => {
            serde_json::from_value(Value::Object(map)).map_err(|e| BusError::InvalidArguments {
                command: name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
