use crate::cli::client;
use crate::config::CapfoxConfig;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct NotifyRequest<'a> {
    task: &'a str,
    complexity: u64,
}

/// `notify --task T --complexity N`: POSTs `/task/notify`.
pub async fn run(config: &CapfoxConfig, task: &str, complexity: u64) -> Result<()> {
    let url = format!("{}/task/notify", config.base_url());
    let body: serde_json::Value = client::build()
        .post(&url)
        .json(&NotifyRequest { task, complexity })
        .send()
        .await
        .context("requesting /task/notify")?
        .json()
        .await
        .context("decoding /task/notify response")?;
    println!("{body}");
    Ok(())
}
