//! CLI argument parsing using clap 4.x derive macros

pub mod config;
pub mod consumer;
pub mod send;
pub mod service;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cmdbus_core::config::ConfigOverrides;

/// File-based command bus
///
/// Scripts, key bindings and agents append one command per line to a shared
/// file; `cmdbus run` turns each line into a host capability call.
#[derive(Parser, Debug)]
#[command(name = "cmdbus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: $XDG_CONFIG_HOME/cmdbus/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Command file to use instead of the configured one
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Log at debug level (RUST_LOG wins when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            command_file: self.file.clone(),
            enabled: None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the command file and emit host calls as JSON lines on stdout
    Run,

    /// Drain the command file once and exit
    Drain {
        /// Show what would be dispatched without consuming the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Append a command to the command file
    Send {
        #[command(subcommand)]
        cmd: SendCommand,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommand>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SendCommand {
    /// Open a terminal attached to a tmux session
    Tmux {
        /// Session name
        #[arg(default_value = "default-session")]
        session: String,

        /// Create the session detached and attach in a second step
        #[arg(short, long)]
        detached: bool,
    },

    /// Open a new terminal, optionally running a command in it
    Terminal {
        /// Terminal title
        #[arg(short, long)]
        name: Option<String>,

        /// Shell executable
        #[arg(short, long)]
        shell: Option<String>,

        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Command line to submit once the terminal exists
        #[arg(trailing_var_arg = true, num_args = 0..)]
        command: Vec<String>,
    },

    /// Show a panel (terminal, output, problems, debug)
    Panel {
        #[arg(default_value = "terminal")]
        panel: String,
    },

    /// Move focus (editor, terminal, sidebar, explorer)
    Focus {
        #[arg(default_value = "editor")]
        target: String,
    },

    /// Open a document, optionally at a line
    Open {
        file: PathBuf,

        /// One-indexed line to place the caret on
        #[arg(short, long)]
        line: Option<u32>,

        /// Editor column to open in
        #[arg(long)]
        column: Option<u32>,

        /// Open as a regular tab instead of a preview
        #[arg(long)]
        no_preview: bool,
    },

    /// Run a host command by identifier
    Invoke {
        /// Host command identifier, e.g. workbench.action.files.save
        command: String,

        /// Arguments; each is parsed as JSON and falls back to a plain string
        args: Vec<String>,
    },

    /// Append a record verbatim: NAME [JSON-OBJECT]
    Raw {
        name: String,

        /// JSON object with the arguments
        args: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
