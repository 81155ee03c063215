use anyhow::{bail, Context, Result};
use serde_json::Value;

use cmdbus_core::client::BridgeClient;
use cmdbus_core::parser::parse_line;
use cmdbus_core::payload::{DocumentArgs, TerminalArgs};

use super::SendCommand;

pub fn handle_send(client: &BridgeClient, cmd: SendCommand) -> Result<()> {
    match cmd {
        SendCommand::Tmux { session, detached } => client.open_session(&session, !detached)?,
        SendCommand::Terminal {
            name,
            shell,
            cwd,
            command,
        } => client.open_terminal(&TerminalArgs {
            name,
            shell,
            cwd,
            command: (!command.is_empty()).then(|| command.join(" ")),
        })?,
        SendCommand::Panel { panel } => client.toggle_panel(&panel)?,
        SendCommand::Focus { target } => client.focus(&target)?,
        SendCommand::Open {
            file,
            line,
            column,
            no_preview,
        } => {
            let file = if file.is_absolute() {
                file
            } else {
                std::env::current_dir()
                    .context("Failed to resolve working directory")?
                    .join(file)
            };
            client.open_file(&DocumentArgs {
                file: Some(file),
                column,
                preview: !no_preview,
                line,
            })?
        }
        SendCommand::Invoke { command, args } => {
            client.execute(&command, args.iter().map(|a| json_or_string(a)).collect())?
        }
        SendCommand::Raw { name, args } => {
            let line = match args {
                Some(args) => format!("{} {}", name, args),
                None => name,
            };
            let command = match parse_line(&line) {
                Some(parsed) => parsed.map_err(|e| anyhow::anyhow!(e.user_message()))?,
                None => bail!("command name must not be empty"),
            };
            client.send(&command)?
        }
    }
    Ok(())
}

fn json_or_string(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
