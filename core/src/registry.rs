//! Command Registry - static name to family table
//!
//! Names are registered once at construction. Anything that does not resolve
//! here goes down the raw invocation path.

use std::collections::HashMap;
use std::fmt;

/// Known command families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFamily {
    MultiplexerSession,
    Terminal,
    Panel,
    Focus,
    Document,
    Execute,
}

impl CommandFamily {
    pub fn label(&self) -> &'static str {
        match self {
            CommandFamily::MultiplexerSession => "open-multiplexer-session",
            CommandFamily::Terminal => "open-terminal",
            CommandFamily::Panel => "toggle-panel",
            CommandFamily::Focus => "route-focus",
            CommandFamily::Document => "open-document",
            CommandFamily::Execute => "execute-command",
        }
    }
}

impl fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct CommandRegistry {
    families: HashMap<String, CommandFamily>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            families: HashMap::new(),
        };

        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register("TMUX", CommandFamily::MultiplexerSession);
        self.register("TERMINAL", CommandFamily::Terminal);
        self.register("PANEL", CommandFamily::Panel);
        self.register("FOCUS", CommandFamily::Focus);
        self.register("EDITOR", CommandFamily::Document);
        self.register("VSCODE", CommandFamily::Execute);
        self.register("INVOKE", CommandFamily::Execute);
    }

    fn register(&mut self, name: &str, family: CommandFamily) {
        self.families.insert(name.to_uppercase(), family);
    }

    /// Resolve an already-uppercased command name
    pub fn resolve(&self, name: &str) -> Option<CommandFamily> {
        self.families.get(name).copied()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
