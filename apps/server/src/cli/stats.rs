use crate::cli::client;
use crate::config::CapfoxConfig;
use anyhow::{Context, Result};

/// `stats [--task T]`: GET `/stats`, or `/stats?task=T` for one task.
pub async fn run(config: &CapfoxConfig, task: Option<&str>) -> Result<()> {
    let mut url = format!("{}/stats", config.base_url());
    if let Some(task) = task {
        url.push_str("?task=");
        url.push_str(&urlencode(task));
    }

    let response = client::build().get(&url).send().await.context("requesting /stats")?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        println!("unknown task");
        return Ok(());
    }
    let body: serde_json::Value = response
        .error_for_status()
        .context("server returned an error for /stats")?
        .json()
        .await
        .context("decoding /stats response")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
