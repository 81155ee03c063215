use anyhow::{bail, Context, Result};
use console::Style;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::consumer::{request_drain, running_consumer, ConsumerClaim, DrainRequests};
use cmdbus_core::bus::{BusLifecycle, CommandBus, DrainReport};
use cmdbus_core::config::{BusConfig, ConfigManager, ConfigOverrides};
use cmdbus_core::host::{Host, JsonLinesHost, RecordingHost};

/// Watch the command file until ctrl-c, following config changes on the way.
/// SIGUSR1 (sent by `cmdbus drain`) drains right away.
pub async fn handle_run(config_path: PathBuf, overrides: ConfigOverrides) -> Result<()> {
    let manager = ConfigManager::load(config_path, overrides)
        .await
        .context("Failed to load configuration")?;
    let config = manager.current();
    let claim = ConsumerClaim::acquire(&config.command_file)?;
    let mut drain_requests = DrainRequests::listen()?;

    let host: Arc<dyn Host> = Arc::new(JsonLinesHost::stdout());
    let bus = Arc::new(CommandBus::from_config(&config, host));
    let lifecycle = Arc::new(BusLifecycle::new(bus));

    let cancel = CancellationToken::new();
    let config_task = manager.start_watcher(cancel.clone());
    let mut follow_task = tokio::spawn({
        let lifecycle = Arc::clone(&lifecycle);
        let changes = manager.subscribe();
        let cancel = cancel.clone();
        async move { lifecycle.follow(changes, cancel).await }
    });

    info!(
        config = %manager.config_path().display(),
        command_file = %config.command_file.display(),
        enabled = config.enabled,
        "command bus running"
    );

    let follow_done = loop {
        tokio::select! {
            res = &mut follow_task => {
                if let Err(e) = res {
                    eprintln!("Command bus error: {:?}", e);
                }
                break true;
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down command bus...");
                break false;
            }
            Some(()) = drain_requests.recv() => drain_on_request(&lifecycle).await,
        }
    };

    cancel.cancel();
    if !follow_done {
        join_logged(follow_task, "config follower").await;
    }
    join_logged(config_task, "config watcher").await;

    let summary = lifecycle.shutdown().await;
    if summary.failed > 0 {
        eprintln!("{} follow-up step(s) failed during shutdown", summary.failed);
    }
    drop(claim);
    Ok(())
}

/// Wait for a background task; returns false if it panicked or was aborted
async fn join_logged(task: JoinHandle<()>, name: &str) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            warn!(task = name, error = %e, "task ended abnormally");
            false
        }
    }
}

/// Manual drain inside the running service, serialized with the watch loop
async fn drain_on_request(lifecycle: &BusLifecycle) {
    info!("manual drain requested");
    match lifecycle.drain_now().await {
        Ok(report) => print_report(&report),
        Err(e) => eprintln!("{}", e.user_message()),
    }
}

/// Drain once. With `dry_run` the file is read but left in place and host
/// calls are printed instead of emitted. When `cmdbus run` already consumes
/// the file, it is asked to drain instead.
pub async fn handle_drain(config: BusConfig, dry_run: bool) -> Result<()> {
    let report = if dry_run {
        dry_run_drain(&config).await?
    } else {
        if let Some(pid) = running_consumer(&config.command_file)? {
            request_drain(pid)?;
            eprintln!(
                "{} (PID: {}) to drain {}",
                Style::new().green().apply_to("Asked the running service"),
                pid,
                config.command_file.display()
            );
            return Ok(());
        }

        let _claim = ConsumerClaim::acquire(&config.command_file)?;
        let host: Arc<dyn Host> = Arc::new(JsonLinesHost::stdout());
        let bus = CommandBus::from_config(&config, host);
        let report = bus.drain().await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
        bus.follow_ups().settle().await;
        report
    };

    print_report(&report);
    if !report.failures.is_empty() {
        bail!("{} line(s) could not be dispatched", report.failures.len());
    }
    Ok(())
}

async fn dry_run_drain(config: &BusConfig) -> Result<DrainReport> {
    let text = match std::fs::read(&config.command_file) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read {}", config.command_file.display())
            })
        }
    };

    let recorder = Arc::new(RecordingHost::new());
    let bus = CommandBus::new(&config.command_file, recorder.clone());
    bus.dispatcher().set_follow_up_delay(Duration::ZERO);
    let report = bus.run_batch(&text).await;
    bus.follow_ups().settle().await;

    let dim = Style::new().dim();
    for call in recorder.take_calls() {
        println!("{} {}", dim.apply_to("would call"), serde_json::to_string(&call)?);
    }
    Ok(report)
}

fn print_report(report: &DrainReport) {
    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    if report.is_empty() {
        eprintln!("{}", dim.apply_to("Command file is empty."));
        return;
    }

    eprintln!("{} {}", green.apply_to("Drained"), report.summary());
    for failure in &report.failures {
        eprintln!(
            "  {} line {} {}: {}",
            red.apply_to("✗"),
            failure.line_no,
            dim.apply_to(&failure.command),
            failure.error.user_message()
        );
    }
}
