//! `run -- <cmd> [args...]`: the admission-gated process wrapper.
//!
//! Exit codes: passthrough of the wrapped process's own code on success;
//! 75 on admission denial (no process started); 126 on non-executable;
//! 127 on not-found. Fails open — if the server cannot be reached at all,
//! the command still runs. A questionable stance for an admission
//! controller, kept anyway: an unreachable gate should not block work.

use crate::cli::client;
use crate::config::CapfoxConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

const EXIT_DENIED: i32 = 75;
const EXIT_NOT_EXECUTABLE: i32 = 126;
const EXIT_NOT_FOUND: i32 = 127;

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    task: &'a str,
    complexity: u64,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    allowed: bool,
}

pub async fn run(config: &CapfoxConfig, task: &str, complexity: u64, cmd: &[String]) -> i32 {
    let Some((program, args)) = cmd.split_first() else {
        eprintln!("capfox run: no command given");
        return EXIT_NOT_FOUND;
    };

    if !ask_admission(config, task, complexity).await {
        eprintln!("capfox run: admission denied for task '{task}'");
        return EXIT_DENIED;
    }

    match tokio::process::Command::new(program).args(args).status().await {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("capfox run: '{program}' not found");
            EXIT_NOT_FOUND
        }
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("capfox run: '{program}' is not executable");
            EXIT_NOT_EXECUTABLE
        }
        Err(err) => {
            eprintln!("capfox run: failed to start '{program}': {err}");
            EXIT_NOT_FOUND
        }
    }
}

/// `true` unless the server was reachable and explicitly denied. A
/// connection failure, timeout or malformed response all fail open.
async fn ask_admission(config: &CapfoxConfig, task: &str, complexity: u64) -> bool {
    let url = format!("{}/v2/ask", config.base_url());
    let response = match client::build().post(&url).json(&AskRequest { task, complexity }).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "capfox server unreachable, failing open");
            return true;
        }
    };

    match response.json::<AskResponse>().await {
        Ok(body) => body.allowed,
        Err(err) => {
            warn!(error = %err, "malformed /v2/ask response, failing open");
            true
        }
    }
}
