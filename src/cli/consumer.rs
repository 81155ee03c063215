//! One consumer per command file
//!
//! `cmdbus run` records its PID next to the command file. `cmdbus drain`
//! finds it there and asks the running service to drain (SIGUSR1) instead of
//! consuming the file from a second process.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<command file>.pid`
pub fn pid_path(command_file: &Path) -> PathBuf {
    let mut name = command_file
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("cmdbus"));
    name.push(".pid");
    command_file.with_file_name(name)
}

/// Exclusive right to consume a command file, released on drop
pub struct ConsumerClaim {
    path: PathBuf,
}

impl ConsumerClaim {
    pub fn acquire(command_file: &Path) -> Result<Self> {
        if let Some(pid) = running_consumer(command_file)? {
            bail!(
                "{} is already consumed by cmdbus (PID: {})",
                command_file.display(),
                pid
            );
        }

        let path = pid_path(command_file);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Another cmdbus process claimed {}", command_file.display()))?;
        write!(file, "{}", std::process::id())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), "claimed command file");
        Ok(Self { path })
    }
}

impl Drop for ConsumerClaim {
    fn drop(&mut self) {
        // best effort
        let _ = fs::remove_file(&self.path);
    }
}

/// PID of a live consumer of `command_file`. A stale PID file is removed.
pub fn running_consumer(command_file: &Path) -> Result<Option<u32>> {
    let path = pid_path(command_file);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    match raw.trim().parse::<u32>() {
        Ok(pid) if is_alive(pid) => Ok(Some(pid)),
        _ => {
            debug!(path = %path.display(), "removing stale PID file");
            let _ = fs::remove_file(&path);
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn is_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_alive(_pid: u32) -> bool {
    true
}

/// Ask the service with `pid` to drain its command file now
#[cfg(unix)]
pub fn request_drain(pid: u32) -> Result<()> {
    let status = std::process::Command::new("kill")
        .arg("-USR1")
        .arg(pid.to_string())
        .status()
        .context("Failed to execute kill command")?;
    if !status.success() {
        bail!("Could not signal cmdbus (PID: {})", pid);
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn request_drain(pid: u32) -> Result<()> {
    bail!(
        "cmdbus is running (PID: {}); drain requests need Unix signals, stop the service first",
        pid
    )
}

/// Manual drain requests delivered to the running service
pub struct DrainRequests {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl DrainRequests {
    pub fn listen() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let signal = signal(SignalKind::user_defined1())
                .context("Failed to listen for SIGUSR1")?;
            Ok(Self { signal })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    pub async fn recv(&mut self) -> Option<()> {
        #[cfg(unix)]
        {
            self.signal.recv().await
        }
        #[cfg(not(unix))]
        {
            std::future::pending().await
        }
    }
}
