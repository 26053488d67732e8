//! C7: assembles a `DecisionContext` from the aggregator, model and pending
//! queue on each `Decide`, and owns the mutable pieces of that context
//! (thresholds, pending tasks) for the handlers to update.

use crate::{DecisionStrategy, PendingQueue};
use capfox_core_aggregator::Aggregator;
use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{ClientHints, DecisionContext, DecisionResult, PendingTask, Thresholds};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct DecisionManager {
    aggregator: Arc<Aggregator>,
    model: Option<Arc<dyn PredictionModel>>,
    strategy: Arc<dyn DecisionStrategy>,
    thresholds: RwLock<Arc<Thresholds>>,
    safety_buffer: f64,
    pending: PendingQueue,
}

impl DecisionManager {
    pub fn new(
        aggregator: Arc<Aggregator>,
        model: Option<Arc<dyn PredictionModel>>,
        strategy: Arc<dyn DecisionStrategy>,
        thresholds: Thresholds,
        safety_buffer: f64,
    ) -> Self {
        Self {
            aggregator,
            model,
            strategy,
            thresholds: RwLock::new(Arc::new(thresholds)),
            safety_buffer,
            pending: PendingQueue::new(),
        }
    }

    pub async fn decide(&self, task: &str, complexity: u64, hints: Option<ClientHints>) -> DecisionResult {
        let current_state = if self.aggregator.ready() {
            Some(self.aggregator.get_state().await)
        } else {
            None
        };
        let prediction = self.model.as_ref().and_then(|m| m.predict(task, complexity));
        let pending_tasks = self.pending.snapshot().await;
        let thresholds = Some((*self.thresholds.read().await).as_ref().clone());

        let ctx = DecisionContext {
            task_name: task.to_string(),
            complexity,
            client_hints: hints,
            current_state,
            prediction,
            thresholds,
            safety_buffer: self.safety_buffer,
            pending_tasks,
        };

        self.strategy.decide(&ctx, self.model.as_deref())
    }

    pub async fn add_pending_task(&self, task: PendingTask) {
        self.pending.add(task).await;
    }

    pub async fn remove_pending_task(&self, task_name: &str) -> Option<PendingTask> {
        self.pending.remove_by_name(task_name).await
    }

    /// Pointer-swap under an exclusive lock.
    pub async fn update_thresholds(&self, thresholds: Thresholds) {
        *self.thresholds.write().await = Arc::new(thresholds);
    }

    pub async fn thresholds(&self) -> Arc<Thresholds> {
        self.thresholds.read().await.clone()
    }

    pub async fn pending_snapshot(&self) -> Vec<PendingTask> {
        self.pending.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThresholdStrategy;
    use capfox_domain_models::{CpuState, SystemState};
    use capfox_core_aggregator::MetricsOverride;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn decide_fails_open_before_aggregator_is_ready() {
        let aggregator = Arc::new(Aggregator::new(vec![], std::time::Duration::from_secs(60)));
        let manager = DecisionManager::new(
            aggregator,
            None,
            Arc::new(ThresholdStrategy),
            Thresholds::default(),
            0.1,
        );
        let result = manager.decide("task", 1, None).await;
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn decide_uses_live_aggregator_state_after_ready() {
        let aggregator = Arc::new(Aggregator::new(vec![], std::time::Duration::from_secs(60)));
        aggregator.start(CancellationToken::new()).await;
        aggregator
            .inject_metrics(MetricsOverride { cpu_overall_percent: Some(95.0), ..Default::default() })
            .await
            .unwrap();

        let manager = DecisionManager::new(
            aggregator,
            None,
            Arc::new(ThresholdStrategy),
            Thresholds { cpu_max_percent: 80.0, ..Thresholds::default() },
            0.1,
        );
        let result = manager.decide("task", 1, None).await;
        assert!(!result.allowed);
        assert_eq!(result.reasons, vec!["cpu_overload"]);
    }

    #[tokio::test]
    async fn add_and_remove_pending_task_round_trip() {
        let aggregator = Arc::new(Aggregator::new(vec![], std::time::Duration::from_secs(60)));
        let manager = DecisionManager::new(
            aggregator,
            None,
            Arc::new(ThresholdStrategy),
            Thresholds::default(),
            0.1,
        );
        manager
            .add_pending_task(PendingTask {
                id: "t_1".to_string(),
                task_name: "t".to_string(),
                complexity: 1,
                started_at: chrono::Utc::now(),
                baseline_state: SystemState::empty(),
                predicted_impact: None,
            })
            .await;
        assert_eq!(manager.pending_snapshot().await.len(), 1);
        assert!(manager.remove_pending_task("t").await.is_some());
        assert!(manager.pending_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn update_thresholds_replaces_pointer() {
        let aggregator = Arc::new(Aggregator::new(vec![], std::time::Duration::from_secs(60)));
        let manager = DecisionManager::new(
            aggregator,
            None,
            Arc::new(ThresholdStrategy),
            Thresholds::default(),
            0.1,
        );
        manager.update_thresholds(Thresholds { cpu_max_percent: 50.0, ..Thresholds::default() }).await;
        assert_eq!(manager.thresholds().await.cpu_max_percent, 50.0);
    }
}
