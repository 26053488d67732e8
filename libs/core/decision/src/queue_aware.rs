//! Identical to Predictive but first adds the pending tasks' expected deltas
//! to current state, then projects the requesting task's own delta on top.

use crate::threshold::ThresholdStrategy;
use crate::{apply_delta, model_backed_decide, DecisionStrategy};
use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{DecisionContext, DecisionResult, ResourceImpact};
use std::sync::Arc;

pub struct QueueAwareStrategy {
    fallback: Arc<dyn DecisionStrategy>,
}

impl QueueAwareStrategy {
    pub fn new(fallback: Arc<dyn DecisionStrategy>) -> Self {
        Self { fallback }
    }
}

impl Default for QueueAwareStrategy {
    fn default() -> Self {
        Self::new(Arc::new(ThresholdStrategy))
    }
}

impl DecisionStrategy for QueueAwareStrategy {
    fn name(&self) -> &str {
        "queue-aware"
    }

    fn decide(&self, ctx: &DecisionContext, model: Option<&dyn PredictionModel>) -> DecisionResult {
        let has_gpu = ctx
            .current_state
            .as_ref()
            .map(|s| !s.gpus.is_empty())
            .unwrap_or(false);
        let pending = ctx.pending_tasks.clone();

        model_backed_decide(ctx, model, self.fallback.as_ref(), self.name(), move |current, delta| {
            let queued = pending_delta_sum(&pending, model, has_gpu);
            apply_delta(current, delta.add(&queued))
        })
    }
}

/// Sums each pending task's stored `predicted_impact`, or a fresh
/// `model.Predict` if none was stored. CPU and memory always contribute;
/// GPU and VRAM only when the current state has a GPU.
fn pending_delta_sum(
    pending_tasks: &[capfox_domain_models::PendingTask],
    model: Option<&dyn PredictionModel>,
    has_gpu: bool,
) -> ResourceImpact {
    let mut sum = ResourceImpact::ZERO;
    for task in pending_tasks {
        let impact = task
            .predicted_impact
            .or_else(|| model.and_then(|m| m.predict(&task.task_name, task.complexity)))
            .unwrap_or(ResourceImpact::ZERO);
        sum.cpu += impact.cpu;
        sum.memory += impact.memory;
        if has_gpu {
            sum.gpu += impact.gpu;
            sum.vram += impact.vram;
        }
    }
    sum
}
