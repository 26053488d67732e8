use crate::cli::client;
use crate::config::CapfoxConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    task: &'a str,
    complexity: u64,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    allowed: bool,
    #[serde(default)]
    reasons: Vec<String>,
}

/// `ask --task T [--complexity N] [--legacy]`: POSTs `/v2/ask` by default,
/// or the threshold-only `/ask` when `--legacy` is set.
pub async fn run(config: &CapfoxConfig, task: &str, complexity: u64, legacy: bool) -> Result<()> {
    let path = if legacy { "/ask?reason=true" } else { "/v2/ask?reason=true" };
    let url = format!("{}{path}", config.base_url());

    let response = client::build()
        .post(&url)
        .json(&AskRequest { task, complexity })
        .send()
        .await
        .context("requesting /ask")?;

    let body: AskResponse = response.json().await.context("decoding /ask response")?;
    println!("{}", json!({ "allowed": body.allowed, "reasons": body.reasons }));
    Ok(())
}
