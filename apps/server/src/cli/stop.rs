use crate::config::CapfoxConfig;
use crate::pidfile;
use anyhow::{bail, Context, Result};

/// `stop`: best-effort graceful shutdown of a running instance, found via
/// its pidfile. The server also handles SIGTERM directly; this
/// is just the CLI-side convenience for sending it.
pub fn run(config: &CapfoxConfig) -> Result<()> {
    let Some(pid) = pidfile::read(&config.server.pid_file) else {
        bail!("no running instance found (pidfile '{}' missing or unreadable)", config.server.pid_file);
    };
    send_signal(pid, "-TERM").context("sending SIGTERM")?;
    println!("sent SIGTERM to pid {pid}");
    Ok(())
}

pub(crate) fn send_signal(pid: u32, flag: &str) -> Result<()> {
    let status = std::process::Command::new("kill")
        .arg(flag)
        .arg(pid.to_string())
        .status()
        .context("spawning kill(1)")?;
    if !status.success() {
        bail!("kill {flag} {pid} exited with {status}");
    }
    Ok(())
}
