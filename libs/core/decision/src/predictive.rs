//! Projects current state forward by the model's predicted delta for the
//! requesting task.

use crate::threshold::ThresholdStrategy;
use crate::{apply_delta, model_backed_decide, DecisionStrategy};
use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{DecisionContext, DecisionResult};
use std::sync::Arc;

pub struct PredictiveStrategy {
    fallback: Arc<dyn DecisionStrategy>,
}

impl PredictiveStrategy {
    pub fn new(fallback: Arc<dyn DecisionStrategy>) -> Self {
        Self { fallback }
    }
}

impl Default for PredictiveStrategy {
    fn default() -> Self {
        Self::new(Arc::new(ThresholdStrategy))
    }
}

impl DecisionStrategy for PredictiveStrategy {
    fn name(&self) -> &str {
        "predictive"
    }

    fn decide(&self, ctx: &DecisionContext, model: Option<&dyn PredictionModel>) -> DecisionResult {
        model_backed_decide(ctx, model, self.fallback.as_ref(), self.name(), |current, delta| {
            apply_delta(current, delta)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capfox_domain_models::{CpuState, ResourceImpact, SystemState, Thresholds};

    fn base_ctx(prediction: Option<ResourceImpact>) -> DecisionContext {
        let mut state = SystemState::empty();
        state.cpu = CpuState::new(50.0, vec![]);
        DecisionContext {
            task_name: "encode".to_string(),
            complexity: 10,
            client_hints: None,
            current_state: Some(state),
            prediction,
            thresholds: Some(Thresholds { cpu_max_percent: 80.0, ..Thresholds::default() }),
            safety_buffer: 0.1,
            pending_tasks: Vec::new(),
        }
    }

    struct FixedConfidence(f64);
    impl PredictionModel for FixedConfidence {
        fn name(&self) -> &str { "fixed" }
        fn learning_type(&self) -> capfox_core_prediction::LearningType { capfox_core_prediction::LearningType::Online }
        fn predict(&self, _task: &str, _complexity: u64) -> Option<ResourceImpact> { None }
        fn observe(&self, _task: &str, _complexity: u64, _impact: ResourceImpact) {}
        fn confidence(&self, _task: &str) -> f64 { self.0 }
        fn stats(&self) -> capfox_core_prediction::ModelStats {
            capfox_core_prediction::ModelStats { name: "fixed".into(), learning_type: capfox_core_prediction::LearningType::Online, tracked_tasks: 0, total_observations: 0 }
        }
        fn task_stats(&self, _task: &str) -> Option<capfox_domain_models::TaskStatsPerTask> { None }
        fn needs_retrain(&self) -> bool { false }
        fn retrain(&self) {}
        fn save(&self, _sink: &mut dyn std::io::Write) -> Result<(), capfox_core_prediction::ModelError> { Ok(()) }
        fn load(&self, _source: &mut dyn std::io::Read) -> Result<(), capfox_core_prediction::ModelError> { Ok(()) }
    }

    #[test]
    fn zero_confidence_falls_back_with_insufficient_data_reason() {
        let ctx = base_ctx(Some(ResourceImpact { cpu: 50.0, ..Default::default() }));
        let model = FixedConfidence(0.0);
        let result = PredictiveStrategy::default().decide(&ctx, Some(&model));
        assert_eq!(result.strategy_name, "threshold");
        assert!(result.reasons.contains(&"insufficient_data".to_string()));
    }

    #[test]
    fn projects_future_state_and_flags_overload() {
        let ctx = base_ctx(Some(ResourceImpact { cpu: 40.0, ..Default::default() }));
        let model = FixedConfidence(0.8);
        let result = PredictiveStrategy::default().decide(&ctx, Some(&model));
        assert!(!result.allowed);
        assert_eq!(result.reasons, vec!["cpu_overload"]);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.predicted_state.unwrap().cpu.overall_percent, 90.0);
    }

    #[test]
    fn missing_prediction_falls_back() {
        let ctx = base_ctx(None);
        let model = FixedConfidence(0.9);
        let result = PredictiveStrategy::default().decide(&ctx, Some(&model));
        assert_eq!(result.strategy_name, "threshold");
    }
}
