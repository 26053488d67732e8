use crate::cli::client;
use crate::config::CapfoxConfig;
use anyhow::{Context, Result};
use capfox_domain_models::SystemState;

pub async fn run(config: &CapfoxConfig) -> Result<()> {
    let url = format!("{}/status", config.base_url());
    let state: SystemState = client::build()
        .get(&url)
        .send()
        .await
        .context("requesting /status")?
        .error_for_status()
        .context("server returned an error for /status")?
        .json()
        .await
        .context("decoding /status response")?;

    println!("cpu:      {:.1}%", state.cpu.overall_percent);
    println!(
        "memory:   {:.1}% ({} / {} bytes)",
        state.memory.percent, state.memory.used_bytes, state.memory.total_bytes
    );
    for gpu in &state.gpus {
        println!(
            "gpu[{}]:   {:.1}% util, {:.1}% vram ({})",
            gpu.index,
            gpu.utilization_percent,
            gpu.vram_percent(),
            gpu.name
        );
    }
    for (mount, usage) in &state.storage {
        println!("disk {mount}: {:.1}% used, {:.1} GiB free", usage.percent, usage.free_gb());
    }
    println!("processes: {}, threads: {}", state.processes, state.threads);
    println!("context switches/s: {:.1}", state.context_switches_per_second);
    println!("collected at: {}", state.timestamp);
    Ok(())
}
