//! Host capability surface
//!
//! The host is the long-lived application the bus drives. The bus never opens
//! terminals or documents itself; it only calls the capabilities below and
//! leaves the side effects to whichever [`Host`] implementation it was given.

pub mod emit;
pub mod recording;

pub use emit::JsonLinesHost;
pub use recording::{HostCall, RecordingHost};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Capability names as they appear in emitted requests and recordings
pub mod capability {
    pub const CREATE_TERMINAL: &str = "createTerminalSurface";
    pub const SEND_TEXT: &str = "sendText";
    pub const SHOW_PANEL: &str = "showPanel";
    pub const FOCUS_REGION: &str = "focusRegion";
    pub const OPEN_DOCUMENT: &str = "openDocument";
    pub const SET_CARET: &str = "setCaret";
    pub const REVEAL_POSITION: &str = "revealPosition";
    pub const INVOKE: &str = "invoke";

    /// Generic host action used when a panel name is not recognized
    pub const TOGGLE_PANEL: &str = "workbench.action.togglePanel";
}

/// Host capability error
#[derive(Debug, Clone)]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host error: {}", self.message)
    }
}

impl std::error::Error for HostError {}

/// Identifier of a terminal surface created by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalId(pub String);

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOptions {
    /// Editor column (group) to show the document in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub preview: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            column: None,
            preview: true,
        }
    }
}

/// Zero-indexed document position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    /// Start of a one-indexed line. Line 0 is read as the first line.
    pub fn line_start(one_indexed: u32) -> Self {
        Self {
            line: one_indexed.saturating_sub(1),
            character: 0,
        }
    }
}

/// Bottom panel regions the host knows how to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Terminal,
    Output,
    Problems,
    Debug,
}

impl FromStr for PanelKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terminal" => Ok(Self::Terminal),
            "output" => Ok(Self::Output),
            "problems" => Ok(Self::Problems),
            "debug" => Ok(Self::Debug),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelKind::Terminal => write!(f, "terminal"),
            PanelKind::Output => write!(f, "output"),
            PanelKind::Problems => write!(f, "problems"),
            PanelKind::Debug => write!(f, "debug"),
        }
    }
}

/// UI regions that can receive input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusTarget {
    Editor,
    Terminal,
    Sidebar,
    Explorer,
}

impl FromStr for FocusTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "editor" => Ok(Self::Editor),
            "terminal" => Ok(Self::Terminal),
            "sidebar" => Ok(Self::Sidebar),
            "explorer" => Ok(Self::Explorer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FocusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusTarget::Editor => write!(f, "editor"),
            FocusTarget::Terminal => write!(f, "terminal"),
            FocusTarget::Sidebar => write!(f, "sidebar"),
            FocusTarget::Explorer => write!(f, "explorer"),
        }
    }
}

/// The capability surface the bus consumes.
///
/// Implementations perform (or forward) the side effect and report failure
/// as a [`HostError`]; the bus catches it at the boundary of the line that
/// caused it.
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    async fn create_terminal(&self, opts: TerminalOptions) -> Result<TerminalId, HostError>;

    /// Submit `text` as a line of input to a terminal surface
    async fn send_text(&self, terminal: &TerminalId, text: &str) -> Result<(), HostError>;

    async fn show_panel(&self, panel: PanelKind) -> Result<(), HostError>;

    async fn focus_region(&self, region: FocusTarget) -> Result<(), HostError>;

    async fn open_document(&self, path: &Path, opts: DocumentOptions) -> Result<(), HostError>;

    async fn set_caret(&self, position: Position) -> Result<(), HostError>;

    async fn reveal_position(&self, position: Position) -> Result<(), HostError>;

    /// Generic command-execution entry point, args are positional
    async fn invoke(&self, capability: &str, args: Vec<Value>) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_start_is_zero_indexed() {
        assert_eq!(Position::line_start(1), Position { line: 0, character: 0 });
        assert_eq!(Position::line_start(42).line, 41);
        assert_eq!(Position::line_start(0).line, 0);
    }

    #[test]
    fn test_region_names_are_case_insensitive() {
        assert_eq!("Terminal".parse::<PanelKind>(), Ok(PanelKind::Terminal));
        assert_eq!(" problems ".parse::<PanelKind>(), Ok(PanelKind::Problems));
        assert!("minimap".parse::<PanelKind>().is_err());

        assert_eq!("EXPLORER".parse::<FocusTarget>(), Ok(FocusTarget::Explorer));
        assert!("statusbar".parse::<FocusTarget>().is_err());
    }

    #[test]
    fn test_document_options_default_to_preview() {
        let opts = DocumentOptions::default();
        assert!(opts.preview);
        assert_eq!(opts.column, None);
    }
}
