use tracing::{debug, info};

use super::{HandlerContext, Outcome};
use crate::host::{DocumentOptions, HostError, Position};
use crate::payload::DocumentArgs;

/// Open `file`, then move the caret to the start of `line` if one was given
pub(super) async fn open_document(
    ctx: &HandlerContext<'_>,
    args: DocumentArgs,
) -> Result<Outcome, HostError> {
    let Some(file) = args.file.filter(|f| !f.as_os_str().is_empty()) else {
        debug!("open-document without a file");
        return Ok(Outcome::no_op("no file given"));
    };

    ctx.host
        .open_document(
            &file,
            DocumentOptions {
                column: args.column,
                preview: args.preview,
            },
        )
        .await?;

    if let Some(line) = args.line {
        let position = Position::line_start(line);
        ctx.host.set_caret(position).await?;
        ctx.host.reveal_position(position).await?;
    }

    info!(file = %file.display(), line = ?args.line, "opened document");
    Ok(Outcome::Completed)
}
