use tracing::info;

use super::{HandlerContext, Outcome};
use crate::host::HostError;
use crate::payload::{Choice, FocusArgs};

pub(super) async fn route_focus(
    ctx: &HandlerContext<'_>,
    args: FocusArgs,
) -> Result<Outcome, HostError> {
    match args.target {
        Choice::Known(region) => {
            ctx.host.focus_region(region).await?;
            Ok(Outcome::Completed)
        }
        Choice::Other(raw) => {
            info!(target_region = %raw, "unrecognized focus target, ignoring");
            Ok(Outcome::no_op(format!("unknown focus target {}", raw)))
        }
    }
}
