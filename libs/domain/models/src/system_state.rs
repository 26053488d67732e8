//! The immutable system-state snapshot produced by the aggregator (C2).

use crate::clamp_percent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Overall CPU utilisation plus a per-core breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuState {
    pub overall_percent: f64,
    pub per_core_percent: Vec<f64>,
}

impl CpuState {
    pub fn new(overall_percent: f64, per_core_percent: Vec<f64>) -> Self {
        Self {
            overall_percent: clamp_percent(overall_percent),
            per_core_percent: per_core_percent.into_iter().map(clamp_percent).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            overall_percent: 0.0,
            per_core_percent: Vec::new(),
        }
    }
}

/// Memory usage in bytes plus the derived percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub percent: f64,
}

impl MemoryState {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        let used_bytes = used_bytes.min(total_bytes.max(used_bytes));
        let percent = if total_bytes == 0 {
            0.0
        } else {
            clamp_percent(used_bytes as f64 / total_bytes as f64 * 100.0)
        };
        Self {
            used_bytes,
            total_bytes,
            percent,
        }
    }

    pub fn empty() -> Self {
        Self {
            used_bytes: 0,
            total_bytes: 0,
            percent: 0.0,
        }
    }
}

/// A single accelerator device as reported by the GPU probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuState {
    pub index: usize,
    pub name: String,
    pub utilization_percent: f64,
    pub vram_used_bytes: u64,
    pub vram_total_bytes: u64,
    pub temperature_celsius: f64,
}

impl GpuState {
    pub fn vram_percent(&self) -> f64 {
        if self.vram_total_bytes == 0 {
            0.0
        } else {
            clamp_percent(self.vram_used_bytes as f64 / self.vram_total_bytes as f64 * 100.0)
        }
    }
}

/// Used/total bytes and derived percent for a single mount path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageMount {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub percent: f64,
}

impl StorageMount {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        let percent = if total_bytes == 0 {
            0.0
        } else {
            clamp_percent(used_bytes as f64 / total_bytes as f64 * 100.0)
        };
        Self {
            used_bytes,
            total_bytes,
            percent,
        }
    }

    pub fn free_gb(&self) -> f64 {
        self.total_bytes.saturating_sub(self.used_bytes) as f64 / 1_073_741_824.0
    }
}

/// The full system snapshot. Deep-cloned on every `Aggregator::get_state`
/// call so callers can never observe a torn or subsequently mutated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub cpu: CpuState,
    pub memory: MemoryState,
    pub gpus: Vec<GpuState>,
    pub storage: HashMap<String, StorageMount>,
    pub processes: u64,
    pub threads: u64,
    pub context_switches_per_second: f64,
    pub timestamp: DateTime<Utc>,
}

impl SystemState {
    /// A zeroed snapshot, used before the first successful collection and
    /// as the substate for probes that failed on a given tick.
    pub fn empty() -> Self {
        Self {
            cpu: CpuState::empty(),
            memory: MemoryState::empty(),
            gpus: Vec::new(),
            storage: HashMap::new(),
            processes: 0,
            threads: 0,
            context_switches_per_second: 0.0,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_cpu() {
        let cpu = CpuState::new(150.0, vec![-5.0, 50.0, 200.0]);
        assert_eq!(cpu.overall_percent, 100.0);
        assert_eq!(cpu.per_core_percent, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn memory_percent_derived_and_clamped() {
        let mem = MemoryState::new(8_000_000_000, 16_000_000_000);
        assert!((mem.percent - 50.0).abs() < 1e-9);

        let zero_total = MemoryState::new(10, 0);
        assert_eq!(zero_total.percent, 0.0);
    }

    #[test]
    fn storage_free_gb() {
        let mount = StorageMount::new(1_073_741_824, 1_073_741_824 * 5);
        assert!((mount.free_gb() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn gpu_vram_percent() {
        let gpu = GpuState {
            index: 0,
            name: "test".into(),
            utilization_percent: 10.0,
            vram_used_bytes: 2_000,
            vram_total_bytes: 4_000,
            temperature_celsius: 60.0,
        };
        assert_eq!(gpu.vram_percent(), 50.0);
    }
}
