//! C2: the aggregator owns the single authoritative `SystemState`, refreshed
//! on a tick by invoking every probe once, and hands out deep clones to
//! concurrent readers under a shared lock.

mod overrides;

pub use overrides::{GpuOverride, MetricsOverride};

use capfox_core_probes::{Probe, ProbeOutput};
use capfox_domain_models::{CpuState, GpuState, MemoryState, StorageMount, SystemState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("gpu_index must be >= 0, got {0}")]
    NegativeGpuIndex(i64),
}

pub struct Aggregator {
    probes: tokio::sync::Mutex<Vec<Box<dyn Probe>>>,
    state: Arc<RwLock<SystemState>>,
    ready: Arc<AtomicBool>,
    interval: Duration,
}

impl Aggregator {
    pub fn new(probes: Vec<Box<dyn Probe>>, interval: Duration) -> Self {
        Self {
            probes: tokio::sync::Mutex::new(probes),
            state: Arc::new(RwLock::new(SystemState::empty())),
            ready: Arc::new(AtomicBool::new(false)),
            interval,
        }
    }

    /// Performs one synchronous collection before returning, then launches
    /// the periodic refresh loop. Readiness (per `Ready`) is achieved the
    /// moment this first collection completes.
    pub async fn start(self: &Arc<Self>, cancel: CancellationToken) {
        self.collect_once().await;

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("aggregator refresh loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        this.collect_once().await;
                    }
                }
            }
        });
    }

    async fn collect_once(&self) {
        let mut probes = self.probes.lock().await;
        let mut next = SystemState::empty();
        next.timestamp = chrono::Utc::now();

        for probe in probes.iter_mut() {
            match probe.collect() {
                Ok(ProbeOutput::Cpu(cpu)) => next.cpu = cpu,
                Ok(ProbeOutput::Memory(memory)) => next.memory = memory,
                Ok(ProbeOutput::Storage(storage)) => next.storage = storage,
                Ok(ProbeOutput::Gpu(gpus)) => next.gpus = gpus,
                Ok(ProbeOutput::Process(sample)) => {
                    next.processes = sample.processes;
                    next.threads = sample.threads;
                    next.context_switches_per_second = sample.context_switches_per_second;
                }
                Err(err) => {
                    // A failed probe's slice stays zeroed for this tick,
                    // it does not carry over the previous value.
                    error!(probe = probe.name(), error = %err, "probe failed this tick, substate zeroed");
                }
            }
        }
        drop(probes);

        *self.state.write().await = next;
        self.ready.store(true, Ordering::Release);
    }

    /// Deep clone of the current snapshot. Never returns torn data: the
    /// whole struct is swapped atomically under the write lock above, and
    /// cloned while holding only the read lock.
    pub async fn get_state(&self) -> SystemState {
        self.state.read().await.clone()
    }

    pub fn ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Applies a patch onto the current state for test injection. Present
    /// fields replace the current value; absent fields are untouched. The
    /// next natural collection may overwrite these values — intentional.
    pub async fn inject_metrics(&self, patch: MetricsOverride) -> Result<(), AggregatorError> {
        if let Some(gpus) = &patch.gpus {
            for gpu in gpus {
                if gpu.index < 0 {
                    return Err(AggregatorError::NegativeGpuIndex(gpu.index));
                }
            }
        }

        let mut state = self.state.write().await;

        if let Some(overall) = patch.cpu_overall_percent {
            let per_core = patch
                .cpu_per_core_percent
                .clone()
                .unwrap_or_else(|| state.cpu.per_core_percent.clone());
            state.cpu = CpuState::new(overall, per_core);
        } else if let Some(per_core) = patch.cpu_per_core_percent {
            state.cpu = CpuState::new(state.cpu.overall_percent, per_core);
        }

        if patch.memory_used_bytes.is_some() || patch.memory_total_bytes.is_some() {
            let used = patch.memory_used_bytes.unwrap_or(state.memory.used_bytes);
            let total = patch
                .memory_total_bytes
                .unwrap_or(state.memory.total_bytes);
            state.memory = MemoryState::new(used, total);
        }

        if let Some(gpu_overrides) = patch.gpus {
            for gpu_patch in gpu_overrides {
                let index = gpu_patch.index as usize;
                while state.gpus.len() <= index {
                    let next_index = state.gpus.len();
                    state.gpus.push(GpuState {
                        index: next_index,
                        name: "unknown".to_string(),
                        utilization_percent: 0.0,
                        vram_used_bytes: 0,
                        vram_total_bytes: 0,
                        temperature_celsius: 0.0,
                    });
                }
                let entry = &mut state.gpus[index];
                if let Some(v) = gpu_patch.utilization_percent {
                    entry.utilization_percent = v.clamp(0.0, 100.0);
                }
                if let Some(v) = gpu_patch.vram_used_bytes {
                    entry.vram_used_bytes = v;
                }
                if let Some(v) = gpu_patch.vram_total_bytes {
                    entry.vram_total_bytes = v;
                }
                if let Some(v) = gpu_patch.temperature_celsius {
                    entry.temperature_celsius = v;
                }
                if let Some(v) = gpu_patch.name {
                    entry.name = v;
                }
            }
        }

        if let Some(storage_patch) = patch.storage {
            for (path, (used, total)) in storage_patch {
                state.storage.insert(path, StorageMount::new(used, total));
            }
        }

        if let Some(v) = patch.processes {
            state.processes = v;
        }
        if let Some(v) = patch.threads {
            state.threads = v;
        }
        if let Some(v) = patch.context_switches_per_second {
            state.context_switches_per_second = v;
        }

        info!("test metrics injected onto aggregator state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capfox_core_probes::ProbeError;

    struct FailingProbe;
    impl Probe for FailingProbe {
        fn name(&self) -> &str {
            "failing"
        }
        fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
            Err(ProbeError::CollectionFailed("failing".into(), "boom".into()))
        }
    }

    struct FixedCpuProbe(f64);
    impl Probe for FixedCpuProbe {
        fn name(&self) -> &str {
            "cpu"
        }
        fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
            Ok(ProbeOutput::Cpu(CpuState::new(self.0, vec![self.0])))
        }
    }

    #[tokio::test]
    async fn ready_after_first_collection() {
        let agg = Arc::new(Aggregator::new(
            vec![Box::new(FixedCpuProbe(42.0))],
            Duration::from_secs(60),
        ));
        assert!(!agg.ready());
        agg.start(CancellationToken::new()).await;
        assert!(agg.ready());
        assert_eq!(agg.get_state().await.cpu.overall_percent, 42.0);
    }

    #[tokio::test]
    async fn failed_probe_zeroes_its_substate_not_carries_previous() {
        let agg = Arc::new(Aggregator::new(
            vec![Box::new(FixedCpuProbe(77.0))],
            Duration::from_secs(60),
        ));
        agg.start(CancellationToken::new()).await;
        assert_eq!(agg.get_state().await.cpu.overall_percent, 77.0);

        // Swap to a probe set where cpu fails: the next tick should zero it.
        *agg.probes.lock().await = vec![Box::new(FailingProbe)];
        agg.collect_once().await;
        assert_eq!(agg.get_state().await.cpu.overall_percent, 0.0);
    }

    #[tokio::test]
    async fn inject_metrics_rejects_negative_gpu_index() {
        let agg = Aggregator::new(vec![], Duration::from_secs(60));
        let patch = MetricsOverride {
            gpus: Some(vec![GpuOverride {
                index: -1,
                ..Default::default()
            }]),
            ..Default::default()
        };
        let result = agg.inject_metrics(patch).await;
        assert!(matches!(result, Err(AggregatorError::NegativeGpuIndex(-1))));
    }

    #[tokio::test]
    async fn inject_metrics_preserves_absent_fields() {
        let agg = Aggregator::new(vec![Box::new(FixedCpuProbe(10.0))], Duration::from_secs(60));
        agg.collect_once().await;

        agg.inject_metrics(MetricsOverride {
            memory_used_bytes: Some(500),
            memory_total_bytes: Some(1000),
            ..Default::default()
        })
        .await
        .unwrap();

        let state = agg.get_state().await;
        assert_eq!(state.cpu.overall_percent, 10.0);
        assert_eq!(state.memory.percent, 50.0);
    }

    #[tokio::test]
    async fn get_state_clones_are_independent() {
        let agg = Aggregator::new(vec![Box::new(FixedCpuProbe(5.0))], Duration::from_secs(60));
        agg.collect_once().await;
        let mut clone_a = agg.get_state().await;
        clone_a.cpu.overall_percent = 999.0;
        let clone_b = agg.get_state().await;
        assert_eq!(clone_b.cpu.overall_percent, 5.0);
    }
}
