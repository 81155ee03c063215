//! Bus lifecycle
//!
//! Owns the watch loop and moves it between `Idle` and `Watching` as the
//! configuration asks. Enabling and disabling are idempotent. Manual drains
//! work in either state.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::watcher::{watch_command_file, WatchHandle};
use super::{CommandBus, DrainReport};
use crate::config::BusConfig;
use crate::error::BusError;
use crate::follow_up::FollowUpSummary;

enum WatchState {
    Idle,
    Watching(WatchHandle),
}

pub struct BusLifecycle {
    bus: Arc<CommandBus>,
    state: Mutex<WatchState>,
}

impl BusLifecycle {
    pub fn new(bus: Arc<CommandBus>) -> Self {
        Self {
            bus,
            state: Mutex::new(WatchState::Idle),
        }
    }

    pub fn bus(&self) -> &Arc<CommandBus> {
        &self.bus
    }

    pub async fn is_watching(&self) -> bool {
        matches!(*self.state.lock().await, WatchState::Watching(_))
    }

    /// Start the watch loop. Returns false if it was already running.
    pub async fn enable(&self) -> Result<bool, BusError> {
        let mut state = self.state.lock().await;
        self.start(&mut state)
    }

    /// Stop the watch loop. Returns false if it was not running.
    pub async fn disable(&self) -> bool {
        let mut state = self.state.lock().await;
        Self::stop(&mut state).await
    }

    /// Bring the bus in line with `config`: tuning, target file and watch state
    pub async fn apply(&self, config: &BusConfig) -> Result<(), BusError> {
        self.bus
            .dispatcher()
            .set_follow_up_delay(config.follow_up_delay());

        let mut state = self.state.lock().await;
        if self.bus.command_file() != config.command_file {
            let was_watching = Self::stop(&mut state).await;
            info!(
                from = %self.bus.command_file().display(),
                to = %config.command_file.display(),
                was_watching,
                "command file moved"
            );
            self.bus.retarget(config.command_file.clone());
        }

        if config.enabled {
            self.start(&mut state)?;
        } else {
            Self::stop(&mut state).await;
        }
        Ok(())
    }

    /// Drain on request, whether or not the watch loop runs
    pub async fn drain_now(&self) -> Result<DrainReport, BusError> {
        self.bus.drain().await
    }

    /// Stop watching and wait for outstanding follow-up steps
    pub async fn shutdown(&self) -> FollowUpSummary {
        self.disable().await;
        self.bus.follow_ups().settle().await
    }

    /// Apply the current config, then every change published on `changes`,
    /// until `cancel` fires or the sender goes away.
    pub async fn follow(&self, mut changes: watch::Receiver<BusConfig>, cancel: CancellationToken) {
        let initial = changes.borrow_and_update().clone();
        self.apply_logged(&initial).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let config = changes.borrow_and_update().clone();
                    self.apply_logged(&config).await;
                }
            }
        }
    }

    async fn apply_logged(&self, config: &BusConfig) {
        if let Err(err) = self.apply(config).await {
            error!(error = %err, "{}", err.user_message());
        }
    }

    fn start(&self, state: &mut WatchState) -> Result<bool, BusError> {
        if let WatchState::Watching(_) = state {
            return Ok(false);
        }
        let handle = watch_command_file(Arc::clone(&self.bus))?;
        *state = WatchState::Watching(handle);
        Ok(true)
    }

    async fn stop(state: &mut WatchState) -> bool {
        match std::mem::replace(state, WatchState::Idle) {
            WatchState::Idle => false,
            WatchState::Watching(handle) => {
                let path = handle.path().to_path_buf();
                handle.stop().await;
                info!(path = %path.display(), "command bus disabled");
                true
            }
        }
    }
}
