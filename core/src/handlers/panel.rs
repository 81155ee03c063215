use tracing::debug;

use super::{HandlerContext, Outcome};
use crate::host::{capability, HostError};
use crate::payload::{Choice, PanelArgs};

pub(super) async fn toggle_panel(
    ctx: &HandlerContext<'_>,
    args: PanelArgs,
) -> Result<Outcome, HostError> {
    match args.panel {
        Choice::Known(panel) => ctx.host.show_panel(panel).await?,
        Choice::Other(raw) => {
            debug!(panel = %raw, "unrecognized panel, toggling panel area");
            ctx.host.invoke(capability::TOGGLE_PANEL, Vec::new()).await?;
        }
    }
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Harness;
    use crate::host::{HostCall, PanelKind};

    #[tokio::test]
    async fn test_known_panel_is_shown() {
        let harness = Harness::new();
        let args = PanelArgs {
            panel: Choice::Known(PanelKind::Problems),
        };
        toggle_panel(&harness.ctx(), args).await.unwrap();
        assert_eq!(
            harness.recorder.calls(),
            vec![HostCall::ShowPanel { panel: PanelKind::Problems }]
        );
    }

    #[tokio::test]
    async fn test_unknown_panel_falls_back_to_toggle() {
        let harness = Harness::new();
        let args = PanelArgs {
            panel: Choice::Other("timeline".to_string()),
        };
        toggle_panel(&harness.ctx(), args).await.unwrap();
        assert_eq!(
            harness.recorder.calls(),
            vec![HostCall::Invoke {
                name: capability::TOGGLE_PANEL.to_string(),
                args: vec![],
            }]
        );
    }
}
