//! Identical to Predictive but scales the delta by `1 + safety_buffer`
//! before projecting. Strictly dominates Predictive: a stricter
//! margin rejects a superset of what Predictive rejects.

use crate::threshold::ThresholdStrategy;
use crate::{apply_delta, model_backed_decide, DecisionStrategy};
use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{DecisionContext, DecisionResult};
use std::sync::Arc;

pub struct ConservativeStrategy {
    fallback: Arc<dyn DecisionStrategy>,
}

impl ConservativeStrategy {
    pub fn new(fallback: Arc<dyn DecisionStrategy>) -> Self {
        Self { fallback }
    }
}

impl Default for ConservativeStrategy {
    fn default() -> Self {
        Self::new(Arc::new(ThresholdStrategy))
    }
}

impl DecisionStrategy for ConservativeStrategy {
    fn name(&self) -> &str {
        "conservative"
    }

    fn decide(&self, ctx: &DecisionContext, model: Option<&dyn PredictionModel>) -> DecisionResult {
        let safety_buffer = ctx.safety_buffer;
        model_backed_decide(ctx, model, self.fallback.as_ref(), self.name(), |current, delta| {
            apply_delta(current, delta.scaled(safety_buffer))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictive::PredictiveStrategy;
    use capfox_domain_models::{CpuState, ResourceImpact, SystemState, Thresholds};

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

    fn base_ctx(prediction: Option<ResourceImpact>, safety_buffer: f64) -> DecisionContext {
        let mut state = SystemState::empty();
        state.cpu = CpuState::new(50.0, vec![]);
        DecisionContext {
            task_name: "encode".to_string(),
            complexity: 10,
            client_hints: None,
            current_state: Some(state),
            prediction,
            thresholds: Some(Thresholds { cpu_max_percent: 85.0, ..Thresholds::default() }),
            safety_buffer,
            pending_tasks: Vec::new(),
        }
    }

    #[test]
    fn dominates_predictive_at_the_margin() {
        // delta of 30 puts predictive exactly at 80 (allowed, max 85);
        // conservative scales by 1.1 -> 33 -> future 83, still under 85 here,
        // but a delta chosen right at the predictive boundary demonstrates
        // conservative is strictly less permissive, not equally permissive.
        let predictive_ctx = base_ctx(Some(ResourceImpact { cpu: 34.0, ..Default::default() }), 0.1);
        let conservative_ctx = base_ctx(Some(ResourceImpact { cpu: 34.0, ..Default::default() }), 0.1);
        let model = FixedConfidence(0.9);

        let predictive_result = PredictiveStrategy::default().decide(&predictive_ctx, Some(&model));
        let conservative_result = ConservativeStrategy::default().decide(&conservative_ctx, Some(&model));

        assert!(predictive_result.allowed);
        assert!(!conservative_result.allowed);
    }
}
