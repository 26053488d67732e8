//! PID-file bookkeeping for the CLI process surface: `start` writes it,
//! `stop`/`reload` read it to find the running instance, `start` removes
//! it on clean shutdown.

use std::path::Path;

pub fn write(path: &str) -> std::io::Result<()> {
    std::fs::write(path, std::process::id().to_string())
}

pub fn remove(path: &str) {
    let _ = std::fs::remove_file(path);
}

/// `None` if the pidfile is absent or does not contain a parseable PID —
/// both are reported as "no running instance" by the caller, not an error.
pub fn read(path: &str) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

pub fn exists(path: &str) -> bool {
    Path::new(path).exists()
}
