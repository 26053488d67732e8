use crate::cli::stop::send_signal;
use crate::config::CapfoxConfig;
use crate::pidfile;
use anyhow::{bail, Context, Result};

/// `reload`: sends SIGHUP to a running instance's PID. The
/// server reloads auth, thresholds, rate limits and logging level/format
/// in place; the bind address is immutable and untouched.
pub fn run(config: &CapfoxConfig) -> Result<()> {
    let Some(pid) = pidfile::read(&config.server.pid_file) else {
        bail!("no running instance found (pidfile '{}' missing or unreadable)", config.server.pid_file);
    };
    send_signal(pid, "-HUP").context("sending SIGHUP")?;
    println!("sent SIGHUP to pid {pid}");
    Ok(())
}
