//! Delayed secondary steps
//!
//! A handler that needs a second host call some time after its first one
//! schedules it here instead of firing an unobserved timer. Each step runs on
//! its own task; its outcome is logged, and [`FollowUps::settle`] waits for
//! everything still pending so callers can observe both steps.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::host::HostError;

/// Result of waiting for pending follow-up steps
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpSummary {
    pub completed: usize,
    pub failed: usize,
}

struct Pending {
    label: String,
    task: JoinHandle<Result<(), HostError>>,
}

#[derive(Default)]
pub struct FollowUps {
    pending: Mutex<Vec<Pending>>,
}

impl FollowUps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `step` after `delay` on a separate task
    pub fn schedule<F>(&self, label: impl Into<String>, delay: Duration, step: F)
    where
        F: Future<Output = Result<(), HostError>> + Send + 'static,
    {
        let label = label.into();
        let task_label = label.clone();
        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = step.await;
            match &result {
                Ok(()) => debug!(step = %task_label, "follow-up step completed"),
                Err(err) => error!(step = %task_label, error = %err, "follow-up step failed"),
            }
            result
        });

        let mut pending = self.pending.lock();
        // finished steps already logged their outcome
        pending.retain(|p| !p.task.is_finished());
        pending.push(Pending { label, task });
    }

    /// Number of steps that have not finished yet
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .iter()
            .filter(|p| !p.task.is_finished())
            .count()
    }

    /// Wait for every tracked step. Steps found finished by a later
    /// [`schedule`](Self::schedule) call are dropped from tracking and not
    /// counted here.
    pub async fn settle(&self) -> FollowUpSummary {
        let pending = std::mem::take(&mut *self.pending.lock());
        let mut summary = FollowUpSummary::default();

        let (labels, tasks): (Vec<_>, Vec<_>) =
            pending.into_iter().map(|p| (p.label, p.task)).unzip();
        let results = futures::future::join_all(tasks).await;

        for (label, result) in labels.iter().zip(results) {
            match result {
                Ok(Ok(())) => summary.completed += 1,
                Ok(Err(_)) => summary.failed += 1,
                Err(join_err) => {
                    error!(step = %label, error = %join_err, "follow-up step aborted");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
