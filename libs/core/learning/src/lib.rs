//! C4: bridges task-lifecycle notifications to a prediction model under a
//! bounded worker pool, with cooperative cancellation.

mod retrain_scheduler;
pub use retrain_scheduler::{RetrainScheduler, SchedulerStats};

use capfox_core_aggregator::Aggregator;
use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{PendingTask, ResourceImpact, SystemState};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::warn;

const DEFAULT_MAX_WORKERS: usize = 100;

pub struct LearningEngine {
    aggregator: Arc<Aggregator>,
    model: Arc<dyn PredictionModel>,
    pending: Arc<RwLock<HashMap<String, PendingTask>>>,
    semaphore: Arc<Semaphore>,
    observation_delay: Duration,
    cancel: CancellationToken,
    tracker: TaskTracker,
    stopped: Arc<AtomicBool>,
    counter: AtomicU64,
}

impl LearningEngine {
    pub fn new(
        aggregator: Arc<Aggregator>,
        model: Arc<dyn PredictionModel>,
        max_workers: usize,
        observation_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let max_workers = if max_workers == 0 { DEFAULT_MAX_WORKERS } else { max_workers };
        Self {
            aggregator,
            model,
            pending: Arc::new(RwLock::new(HashMap::new())),
            semaphore: Arc::new(Semaphore::new(max_workers)),
            observation_delay,
            cancel,
            tracker: TaskTracker::new(),
            stopped: Arc::new(AtomicBool::new(false)),
            counter: AtomicU64::new(0),
        }
    }

    /// Captures a `SystemState` baseline, assigns a locally unique task id,
    /// and spawns a delayed observation worker. Returns `None` (a silent
    /// no-op) once the engine has been stopped.
    pub async fn notify_task_start(self: &Arc<Self>, task: &str, complexity: u64) -> Option<String> {
        if self.stopped.load(Ordering::Acquire) {
            return None;
        }

        let baseline_state = self.aggregator.get_state().await;
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) % 1000;
        let task_id = format!("{}_{}_{}", task, Utc::now().timestamp_millis(), counter);

        let pending_task = PendingTask {
            id: task_id.clone(),
            task_name: task.to_string(),
            complexity,
            started_at: Utc::now(),
            baseline_state,
            predicted_impact: self.model.predict(task, complexity),
        };
        self.pending.write().await.insert(task_id.clone(), pending_task);

        let this = Arc::clone(self);
        let worker_id = task_id.clone();
        self.tracker.spawn(async move {
            let permit = tokio::select! {
                _ = this.cancel.cancelled() => None,
                permit = this.semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                this.pending.write().await.remove(&worker_id);
                return;
            };

            tokio::select! {
                _ = this.cancel.cancelled() => {
                    this.pending.write().await.remove(&worker_id);
                }
                _ = tokio::time::sleep(this.observation_delay) => {
                    this.observe(&worker_id).await;
                }
            }
            drop(permit);
        });

        Some(task_id)
    }

    /// Removes the pending task, diffs current state against its baseline,
    /// and feeds the delta to the model. Logs and skips if the task is no
    /// longer pending (e.g. a racing `Stop`).
    async fn observe(&self, task_id: &str) {
        let task = self.pending.write().await.remove(task_id);
        let Some(task) = task else {
            warn!(task_id, "observe called for a task no longer pending, skipping");
            return;
        };

        let current = self.aggregator.get_state().await;
        let impact = resource_delta(&task.baseline_state, &current);
        self.model.observe(&task.task_name, task.complexity, impact);
    }

    /// Idempotent: cancels outstanding workers and waits for them to drain.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Idempotent. Returns after `timeout` with a warning if workers have
    /// not drained by then; they continue draining in the background.
    pub async fn stop_with_timeout(&self, timeout: Duration) {
        self.stopped.store(true, Ordering::Release);
        self.cancel.cancel();
        self.tracker.close();
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            warn!(?timeout, "learning engine workers did not drain within timeout");
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    pub fn active_workers(&self) -> usize {
        self.tracker.len()
    }
}

/// `current - baseline` for CPU% and memory%; GPU/VRAM deltas are averaged
/// across `min(len(baseline.gpus), len(current.gpus))` devices, zero if
/// either side has no GPUs.
fn resource_delta(baseline: &SystemState, current: &SystemState) -> ResourceImpact {
    let cpu = current.cpu.overall_percent - baseline.cpu.overall_percent;
    let memory = current.memory.percent - baseline.memory.percent;

    let device_count = baseline.gpus.len().min(current.gpus.len());
    let (gpu, vram) = if device_count == 0 {
        (0.0, 0.0)
    } else {
        let mut gpu_sum = 0.0;
        let mut vram_sum = 0.0;
        for i in 0..device_count {
            gpu_sum += current.gpus[i].utilization_percent - baseline.gpus[i].utilization_percent;
            vram_sum += current.gpus[i].vram_percent() - baseline.gpus[i].vram_percent();
        }
        (gpu_sum / device_count as f64, vram_sum / device_count as f64)
    };

    ResourceImpact { cpu, memory, gpu, vram }
}
