use tracing::info;

use super::{HandlerContext, Outcome};
use crate::host::{HostError, TerminalOptions};
use crate::payload::TerminalArgs;

pub(super) async fn open_terminal(
    ctx: &HandlerContext<'_>,
    args: TerminalArgs,
) -> Result<Outcome, HostError> {
    let TerminalArgs {
        name,
        shell,
        cwd,
        command,
    } = args;

    let terminal = ctx
        .host
        .create_terminal(TerminalOptions { name, shell, cwd })
        .await?;

    // submitted as input; whether it succeeds is up to the shell
    if let Some(command) = command.filter(|c| !c.trim().is_empty()) {
        ctx.host.send_text(&terminal, &command).await?;
    }

    info!(terminal = %terminal, "opened terminal");
    Ok(Outcome::Completed)
}
