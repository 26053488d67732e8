//! Test-injection overlay applied on top of the current snapshot
//! (`Aggregator::inject_metrics`). Every field is optional;
//! absent fields preserve the current value, present fields replace it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuOverride {
    pub index: i64,
    pub utilization_percent: Option<f64>,
    pub vram_used_bytes: Option<u64>,
    pub vram_total_bytes: Option<u64>,
    pub temperature_celsius: Option<f64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsOverride {
    pub cpu_overall_percent: Option<f64>,
    pub cpu_per_core_percent: Option<Vec<f64>>,
    pub memory_used_bytes: Option<u64>,
    pub memory_total_bytes: Option<u64>,
    pub gpus: Option<Vec<GpuOverride>>,
    pub storage: Option<std::collections::HashMap<String, (u64, u64)>>,
    pub processes: Option<u64>,
    pub threads: Option<u64>,
    pub context_switches_per_second: Option<f64>,
}
