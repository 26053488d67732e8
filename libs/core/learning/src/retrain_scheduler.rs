//! C5: a ticker that periodically asks a batch model whether it needs
//! retraining and, if so, retrains it.

use capfox_core_prediction::PredictionModel;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct SchedulerStats {
    pub running: bool,
    pub interval: Duration,
    pub retrain_count: u64,
    pub last_retrain: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct Inner {
    last_retrain: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

pub struct RetrainScheduler {
    model: Arc<dyn PredictionModel>,
    interval: Duration,
    cancel: CancellationToken,
    running: std::sync::atomic::AtomicBool,
    retrain_count: AtomicU64,
    inner: Mutex<Inner>,
    force: Notify,
    force_requested: std::sync::atomic::AtomicBool,
    stopped: Arc<Notify>,
}

impl RetrainScheduler {
    pub fn new(model: Arc<dyn PredictionModel>, interval: Duration, cancel: CancellationToken) -> Self {
        let interval = if interval.is_zero() { DEFAULT_INTERVAL } else { interval };
        Self {
            model,
            interval,
            cancel,
            running: std::sync::atomic::AtomicBool::new(false),
            retrain_count: AtomicU64::new(0),
            inner: Mutex::new(Inner { last_retrain: None, last_error: None }),
            force: Notify::new(),
            force_requested: std::sync::atomic::AtomicBool::new(false),
            stopped: Arc::new(Notify::new()),
        }
    }

    /// Seeds the counters from a restored snapshot before `start`.
    pub fn seed_from_snapshot(&self, retrain_count: u64, last_retrain: Option<DateTime<Utc>>) {
        self.retrain_count.store(retrain_count, Ordering::Relaxed);
        self.inner.lock().unwrap().last_retrain = last_retrain;
    }

    pub fn start(self: &Arc<Self>) {
        self.running.store(true, Ordering::Release);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            ticker.tick().await; // discard the immediate first tick

            loop {
                tokio::select! {
                    _ = this.cancel.cancelled() => {
                        debug!("retrain scheduler cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        this.maybe_retrain();
                    }
                    _ = this.force.notified() => {
                        this.force_requested.store(false, Ordering::Release);
                        this.do_retrain();
                    }
                }
            }
            this.running.store(false, Ordering::Release);
            this.stopped.notify_waiters();
        });
    }

    fn maybe_retrain(&self) {
        if self.model.needs_retrain() {
            self.do_retrain();
        }
    }

    fn do_retrain(&self) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.model.retrain()));
        let mut inner = self.inner.lock().unwrap();
        match result {
            Ok(()) => {
                inner.last_retrain = Some(Utc::now());
                inner.last_error = None;
                self.retrain_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                let message = "retrain panicked".to_string();
                error!(error = %message, "model retrain failed");
                inner.last_error = Some(message);
            }
        }
    }

    /// Bypasses both the need-check and the schedule.
    pub fn force_retrain(&self) {
        self.force_requested.store(true, Ordering::Release);
        self.force.notify_one();
    }

    /// Idempotent; synchronously awaits the loop's exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            // Already stopped (or never started); cancel is still safe to
            // call again since CancellationToken::cancel is itself
            // idempotent.
            self.cancel.cancel();
            return;
        }
        self.running.store(true, Ordering::Release); // restore; the loop itself flips this false on exit
        let notified = self.stopped.notified();
        self.cancel.cancel();
        notified.await;
    }

    pub fn stats(&self) -> SchedulerStats {
        let inner = self.inner.lock().unwrap();
        SchedulerStats {
            running: self.running.load(Ordering::Acquire),
            interval: self.interval,
            retrain_count: self.retrain_count.load(Ordering::Relaxed),
            last_retrain: inner.last_retrain,
            last_error: inner.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capfox_core_prediction::GradientBoostModel;
    use capfox_domain_models::ResourceImpact;

    #[tokio::test]
    async fn force_retrain_bypasses_need_check() {
        let model = Arc::new(GradientBoostModel::new(100, 100, Duration::from_secs(3600)));
        let scheduler = Arc::new(RetrainScheduler::new(model.clone(), Duration::from_secs(3600), CancellationToken::new()));
        scheduler.start();

        model.observe("t", 1, ResourceImpact::default());
        assert!(!model.needs_retrain()); // below min_observations

        scheduler.force_retrain();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(scheduler.stats().retrain_count, 1);
    }

    #[tokio::test]
    async fn seed_from_snapshot_restores_counters() {
        let model = Arc::new(GradientBoostModel::default());
        let scheduler = RetrainScheduler::new(model, Duration::from_secs(3600), CancellationToken::new());
        let last = Utc::now();
        scheduler.seed_from_snapshot(7, Some(last));
        let stats = scheduler.stats();
        assert_eq!(stats.retrain_count, 7);
        assert_eq!(stats.last_retrain, Some(last));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let model = Arc::new(GradientBoostModel::default());
        let scheduler = Arc::new(RetrainScheduler::new(model, Duration::from_secs(3600), CancellationToken::new()));
        scheduler.start();
        scheduler.stop().await;
        scheduler.stop().await;
    }
}
