//! Raw access to the host's generic command entry point.
//!
//! Both paths log under the `cmdbus::raw` target so raw access can be
//! audited separately from the named families.

use serde_json::Value;
use tracing::{debug, info};

use super::{HandlerContext, Outcome};
use crate::host::HostError;
use crate::payload::ExecuteArgs;

/// `VSCODE {"command": .., "args": [..]}`
pub(super) async fn execute(
    ctx: &HandlerContext<'_>,
    args: ExecuteArgs,
) -> Result<Outcome, HostError> {
    let Some(command) = args.command.filter(|c| !c.trim().is_empty()) else {
        debug!(target: "cmdbus::raw", "execute-command without a command");
        return Ok(Outcome::no_op("no command given"));
    };

    info!(target: "cmdbus::raw", capability = %command, argc = args.args.len(), "executing host command");
    ctx.host.invoke(&command, args.args).await?;
    Ok(Outcome::Completed)
}

/// Unregistered name, forwarded verbatim
pub(super) async fn raw(
    ctx: &HandlerContext<'_>,
    name: &str,
    args: Vec<Value>,
) -> Result<Outcome, HostError> {
    info!(target: "cmdbus::raw", capability = %name, argc = args.len(), "raw host invocation");
    ctx.host.invoke(name, args).await?;
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Harness;
    use crate::host::HostCall;
    use serde_json::json;

    #[tokio::test]
    async fn test_raw_forwards_verbatim() {
        let harness = Harness::new();
        raw(&harness.ctx(), "PING", vec![json!({"x": 1})]).await.unwrap();
        assert_eq!(
            harness.recorder.calls(),
            vec![HostCall::Invoke {
                name: "PING".to_string(),
                args: vec![json!({"x": 1})],
            }]
        );
    }

    #[tokio::test]
    async fn test_execute_spreads_positional_args() {
        let harness = Harness::new();
        let args = ExecuteArgs {
            command: Some("workbench.action.tasks.runTask".to_string()),
            args: vec![json!("build"), json!(true)],
        };
        execute(&harness.ctx(), args).await.unwrap();
        assert_eq!(
            harness.recorder.calls(),
            vec![HostCall::Invoke {
                name: "workbench.action.tasks.runTask".to_string(),
                args: vec![json!("build"), json!(true)],
            }]
        );
    }

    #[tokio::test]
    async fn test_execute_without_command_is_no_op() {
        let harness = Harness::new();
        let outcome = execute(&harness.ctx(), ExecuteArgs::default()).await.unwrap();
        assert!(matches!(outcome, Outcome::NoOp { .. }));
        assert!(harness.recorder.calls().is_empty());
    }
}
