//! Command Dispatcher
//!
//! Resolves a parsed command against the registry, decodes its payload for
//! the matching family and runs exactly one handler. Errors come back with
//! the command name attached; catching them per line is the caller's job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::BusError;
use crate::follow_up::FollowUps;
use crate::handlers::{self, HandlerContext, Outcome};
use crate::host::Host;
use crate::parser::Command;
use crate::payload::Instruction;
use crate::registry::CommandRegistry;

pub struct Dispatcher {
    registry: CommandRegistry,
    host: Arc<dyn Host>,
    follow_ups: FollowUps,
    follow_up_delay_ms: AtomicU64,
}

impl Dispatcher {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            host,
            follow_ups: FollowUps::new(),
            follow_up_delay_ms: AtomicU64::new(crate::config::DEFAULT_FOLLOW_UP_DELAY_MS),
        }
    }

    pub fn follow_ups(&self) -> &FollowUps {
        &self.follow_ups
    }

    pub fn set_follow_up_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.follow_up_delay_ms.store(millis, Ordering::Relaxed);
    }

    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms.load(Ordering::Relaxed))
    }

    /// Run the handler for one command.
    ///
    /// Awaits the handler's immediate work only; scheduled follow-up steps
    /// continue on their own.
    pub async fn dispatch(&self, command: Command) -> Result<Outcome, BusError> {
        let family = self.registry.resolve(&command.name);
        let name = command.name.clone();
        let instruction = Instruction::decode(family, command)?;

        let ctx = HandlerContext {
            host: &self.host,
            follow_ups: &self.follow_ups,
            follow_up_delay: self.follow_up_delay(),
        };

        handlers::run(&ctx, instruction)
            .await
            .map_err(|err| BusError::handler(name, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{capability, FocusTarget, HostCall, RecordingHost};
    use crate::parser::parse_line;
    use serde_json::json;

    fn dispatcher() -> (Arc<RecordingHost>, Dispatcher) {
        let recorder = Arc::new(RecordingHost::new());
        let dispatcher = Dispatcher::new(recorder.clone());
        (recorder, dispatcher)
    }

    fn command(line: &str) -> Command {
        parse_line(line).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_known_family_is_routed() {
        let (recorder, dispatcher) = dispatcher();
        let outcome = dispatcher
            .dispatch(command(r#"focus {"target":"terminal"}"#))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(
            recorder.calls(),
            vec![HostCall::FocusRegion { region: FocusTarget::Terminal }]
        );
    }

    #[tokio::test]
    async fn test_unknown_name_goes_raw() {
        let (recorder, dispatcher) = dispatcher();
        dispatcher.dispatch(command(r#"PING {"x":1}"#)).await.unwrap();
        assert_eq!(
            recorder.calls(),
            vec![HostCall::Invoke {
                name: "PING".to_string(),
                args: vec![json!({"x": 1})],
            }]
        );
    }

    #[tokio::test]
    async fn test_host_failure_carries_command_name() {
        let (recorder, dispatcher) = dispatcher();
        recorder.fail_on(capability::SHOW_PANEL);
        let err = dispatcher.dispatch(command("PANEL")).await.unwrap_err();
        match err {
            BusError::HandlerFailed { command, message } => {
                assert_eq!(command, "PANEL");
                assert!(message.contains("showPanel"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_runs_no_handler() {
        let (recorder, dispatcher) = dispatcher();
        let err = dispatcher
            .dispatch(command(r#"TMUX {"attach": "yes"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::InvalidArguments { .. }));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_follow_up_delay_is_adjustable() {
        let (_, dispatcher) = dispatcher();
        dispatcher.set_follow_up_delay(Duration::from_millis(1200));
        assert_eq!(dispatcher.follow_up_delay(), Duration::from_millis(1200));
    }
}
