//! File watch loop
//!
//! Registers a notify watcher on the directory holding the command file and
//! drains the bus whenever that file is created or modified. Bursts of events
//! that pile up while a drain runs collapse into one more drain.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::CommandBus;
use crate::error::BusError;

/// A running watch loop. Dropping it without [`stop`](Self::stop) leaves the
/// task to exit on its own once the watcher is gone.
pub struct WatchHandle {
    path: PathBuf,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    watcher: RecommendedWatcher,
}

impl WatchHandle {
    /// The command file this loop drains
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop reacting to changes. A drain already in progress finishes first.
    pub async fn stop(self) {
        let WatchHandle {
            path,
            cancel,
            task,
            watcher,
        } = self;
        drop(watcher);
        cancel.cancel();
        if let Err(e) = task.await {
            warn!(error = %e, "watch task ended abnormally");
        }
        debug!(path = %path.display(), "stopped watching command file");
    }
}

/// Start watching the bus's command file.
///
/// Creates the file if needed and runs one catch-up drain right away so lines
/// written while nobody was watching are not stranded.
pub fn watch_command_file(bus: Arc<CommandBus>) -> Result<WatchHandle, BusError> {
    bus.ensure_inbox()?;
    let path = bus.command_file();
    let file_name = path.file_name().map(OsString::from);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel::<()>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if touches_command_file(&event, file_name.as_deref()) {
                let _ = event_tx.send(());
            }
        }
        Err(err) => warn!(error = %err, "command file watcher error"),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(watch_loop(bus, event_rx, cancel.clone()));
    info!(path = %path.display(), "watching command file");

    Ok(WatchHandle {
        path,
        cancel,
        task,
        watcher,
    })
}

fn touches_command_file(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    ) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some() && p.file_name() == file_name)
}

async fn watch_loop(
    bus: Arc<CommandBus>,
    mut events: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
) {
    drain_logged(&bus).await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv() => {
                if event.is_none() {
                    break;
                }
                while events.try_recv().is_ok() {}
                drain_logged(&bus).await;
            }
        }
    }
}

async fn drain_logged(bus: &CommandBus) {
    if let Err(err) = bus.drain().await {
        warn!(error = %err, "drain failed, waiting for the next change");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostCall, PanelKind, RecordingHost};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn wait_for_calls(recorder: &RecordingHost, count: usize) -> Vec<HostCall> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let calls = recorder.calls();
                if calls.len() >= count {
                    return calls;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("host calls within timeout")
    }

    #[test]
    fn test_event_filter() {
        let target = PathBuf::from("/tmp/box/inbox");
        let name = target.file_name();

        let create = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(target.clone());
        assert!(touches_command_file(&create, name));

        let other = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(PathBuf::from("/tmp/box/inbox.swp"));
        assert!(!touches_command_file(&other, name));

        let removed = Event::new(EventKind::Remove(notify::event::RemoveKind::File))
            .add_path(target.clone());
        assert!(!touches_command_file(&removed, name));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_appended_lines_are_drained() {
        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(RecordingHost::new());
        let bus = Arc::new(CommandBus::new(dir.path().join("inbox"), recorder.clone()));

        let handle = watch_command_file(Arc::clone(&bus)).unwrap();
        assert_eq!(handle.path(), bus.command_file());

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(bus.command_file())
            .unwrap();
        file.write_all(b"PANEL {\"panel\":\"output\"}\n").unwrap();
        drop(file);

        let calls = wait_for_calls(&recorder, 1).await;
        assert_eq!(calls, vec![HostCall::ShowPanel { panel: PanelKind::Output }]);

        handle.stop().await;
        assert_eq!(std::fs::read_to_string(bus.command_file()).unwrap(), "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_catch_up_drain_on_start() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inbox");
        std::fs::write(&path, "FOCUS\n").unwrap();

        let recorder = Arc::new(RecordingHost::new());
        let bus = Arc::new(CommandBus::new(&path, recorder.clone()));
        let handle = watch_command_file(bus).unwrap();

        assert_eq!(wait_for_calls(&recorder, 1).await.len(), 1);
        handle.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stopped_loop_ignores_writes() {
        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(RecordingHost::new());
        let bus = Arc::new(CommandBus::new(dir.path().join("inbox"), recorder.clone()));

        let handle = watch_command_file(Arc::clone(&bus)).unwrap();
        handle.stop().await;

        std::fs::write(bus.command_file(), "PANEL\n").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(recorder.calls().is_empty());
        assert_eq!(std::fs::read_to_string(bus.command_file()).unwrap(), "PANEL\n");
    }
}
