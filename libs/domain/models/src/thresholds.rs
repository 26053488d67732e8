//! Runtime-updatable admission thresholds (§3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu_max_percent: f64,
    pub memory_max_percent: f64,
    pub gpu_max_percent: f64,
    pub vram_max_percent: f64,
    pub storage_min_free_gb: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_max_percent: 80.0,
            memory_max_percent: 85.0,
            gpu_max_percent: 90.0,
            vram_max_percent: 90.0,
            storage_min_free_gb: 10.0,
        }
    }
}
