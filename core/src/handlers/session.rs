use std::sync::Arc;
use tracing::info;

use super::{HandlerContext, Outcome};
use crate::host::{HostError, TerminalOptions};
use crate::payload::SessionArgs;

/// Materialize a terminal attached to a persistent tmux session.
///
/// With `attach = false` the session is created detached first and the
/// attach is submitted as a scheduled second step.
pub(super) async fn open_session(
    ctx: &HandlerContext<'_>,
    args: SessionArgs,
) -> Result<Outcome, HostError> {
    let session = match args.session.trim() {
        "" => SessionArgs::default().session,
        name => name.to_string(),
    };
    let quoted = shell_words::quote(&session).into_owned();
    let terminal = ctx
        .host
        .create_terminal(TerminalOptions {
            name: Some(format!("tmux: {}", session)),
            ..Default::default()
        })
        .await?;

    if args.attach {
        ctx.host
            .send_text(&terminal, &format!("tmux new-session -A -s {}", quoted))
            .await?;
        info!(session = %session, "opened multiplexer session");
        return Ok(Outcome::Completed);
    }

    ctx.host
        .send_text(&terminal, &format!("tmux new-session -d -s {}", quoted))
        .await?;

    let host = Arc::clone(ctx.host);
    let attach = format!("tmux attach -t {}", quoted);
    ctx.follow_ups.schedule(
        format!("attach tmux session {}", session),
        ctx.follow_up_delay,
        async move { host.send_text(&terminal, &attach).await },
    );
    info!(session = %session, "created detached multiplexer session, attach scheduled");
    Ok(Outcome::FollowUpScheduled)
}
