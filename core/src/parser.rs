//! Command line grammar
//!
//! One record per line: `<NAME> [<JSON-OBJECT>]`. The name is the first
//! whitespace-delimited token and is matched case-insensitively, so it is
//! normalized to uppercase here. Whatever follows the name, trimmed, must be
//! empty or a JSON object.

use serde_json::{Map, Value};
use std::fmt;

use crate::error::BusError;

/// A parsed command record
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Uppercased, never empty
    pub name: String,
    /// `None` when the line carries no argument fragment
    pub args: Option<Map<String, Value>>,
}

impl Command {
    pub fn new(name: &str, args: Option<Map<String, Value>>) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            args,
        }
    }
}

/// Wire form of the command, without the trailing newline
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.args {
            Some(args) => write!(f, "{} {}", self.name, Value::Object(args.clone())),
            None => f.write_str(&self.name),
        }
    }
}

/// Parse one line of the command file.
///
/// Blank and whitespace-only lines yield `None`. Every other line yields
/// exactly one of a [`Command`] or [`BusError::MalformedArguments`].
pub fn parse_line(line: &str) -> Option<Result<Command, BusError>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (token, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (trimmed, ""),
    };
    let name = token.to_uppercase();

    if rest.is_empty() {
        return Some(Ok(Command { name, args: None }));
    }

    let parsed = match serde_json::from_str::<Value>(rest) {
        Ok(Value::Object(map)) => Ok(Command {
            name,
            args: Some(map),
        }),
        Ok(other) => Err(BusError::MalformedArguments {
            command: name,
            line: trimmed.to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
        Err(e) => Err(BusError::MalformedArguments {
            command: name,
            line: trimmed.to_string(),
            reason: e.to_string(),
        }),
    };
    Some(parsed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
