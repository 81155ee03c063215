//! Capability handlers
//!
//! One handler per command family. Each receives an already-decoded payload
//! and turns it into zero or more host capability calls. A host error is
//! returned as-is; the dispatcher attaches the command name.

mod document;
mod focus;
mod invoke;
mod panel;
mod session;
mod terminal;

use std::sync::Arc;
use std::time::Duration;

use crate::follow_up::FollowUps;
use crate::host::{Host, HostError};
use crate::payload::Instruction;

/// What a handler did with its command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// First step done, a second one is scheduled on [`FollowUps`]
    FollowUpScheduled,
    /// Nothing to do; the reason is logged
    NoOp { reason: String },
}

impl Outcome {
    pub(crate) fn no_op(reason: impl Into<String>) -> Self {
        Self::NoOp {
            reason: reason.into(),
        }
    }
}

pub struct HandlerContext<'a> {
    pub host: &'a Arc<dyn Host>,
    pub follow_ups: &'a FollowUps,
    pub follow_up_delay: Duration,
}

pub(crate) async fn run(
    ctx: &HandlerContext<'_>,
    instruction: Instruction,
) -> Result<Outcome, HostError> {
    match instruction {
        Instruction::OpenSession(args) => session::open_session(ctx, args).await,
        Instruction::OpenTerminal(args) => terminal::open_terminal(ctx, args).await,
        Instruction::TogglePanel(args) => panel::toggle_panel(ctx, args).await,
        Instruction::RouteFocus(args) => focus::route_focus(ctx, args).await,
        Instruction::OpenDocument(args) => document::open_document(ctx, args).await,
        Instruction::Execute(args) => invoke::execute(ctx, args).await,
        Instruction::Raw { name, args } => invoke::raw(ctx, &name, args).await,
    }
}
