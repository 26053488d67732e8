//! C6-C8: admission decision strategies, the manager that assembles their
//! context and the pending-task queue feeding the queue-aware strategy.

mod conservative;
mod manager;
mod predictive;
mod queue;
mod queue_aware;
mod threshold;

pub use conservative::ConservativeStrategy;
pub use manager::DecisionManager;
pub use predictive::PredictiveStrategy;
pub use queue::PendingQueue;
pub use queue_aware::QueueAwareStrategy;
pub use threshold::ThresholdStrategy;

use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{clamp_percent, DecisionContext, DecisionResult, SystemState};

/// Uniform strategy interface. Every strategy must, given a
/// null current state or null thresholds, return `DecisionResult::fail_open`
/// — degenerate callers never block a launch for lack of information.
pub trait DecisionStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn decide(&self, ctx: &DecisionContext, model: Option<&dyn PredictionModel>) -> DecisionResult;
}

/// Applies a resource delta to `current`, clamping every percent into
/// `[0, 100]`. Only the first GPU is projected — the predictive family of
/// strategies only ever derives a delta for `current.gpus[0]`.
fn apply_delta(current: &SystemState, delta: capfox_domain_models::ResourceImpact) -> SystemState {
    let mut future = current.clone();
    future.cpu.overall_percent = clamp_percent(current.cpu.overall_percent + delta.cpu);
    future.memory.percent = clamp_percent(current.memory.percent + delta.memory);
    if let (Some(future_gpu), Some(current_gpu)) = (future.gpus.first_mut(), current.gpus.first()) {
        let future_vram_percent = clamp_percent(current_gpu.vram_percent() + delta.vram);
        future_gpu.utilization_percent = clamp_percent(current_gpu.utilization_percent + delta.gpu);
        future_gpu.vram_used_bytes = (future_vram_percent / 100.0 * current_gpu.vram_total_bytes as f64) as u64;
    }
    future
}

/// Reason codes against a projected future state (storage excluded — it is
/// not predicted).
fn violations_against_future(future: &SystemState, thresholds: &capfox_domain_models::Thresholds) -> Vec<String> {
    let mut reasons = Vec::new();
    if future.cpu.overall_percent > thresholds.cpu_max_percent {
        reasons.push("cpu_overload".to_string());
    }
    if future.memory.percent > thresholds.memory_max_percent {
        reasons.push("memory_overload".to_string());
    }
    if let Some(gpu) = future.gpus.first() {
        if gpu.utilization_percent > thresholds.gpu_max_percent {
            reasons.push("gpu_overload".to_string());
        }
        if gpu.vram_percent() > thresholds.vram_max_percent {
            reasons.push("vram_overload".to_string());
        }
    }
    reasons
}

/// Shared "depends on a model" preamble used by predictive, conservative and
/// queue-aware: missing current state / thresholds fail open; missing
/// prediction or zero confidence falls back, tagging `insufficient_data`.
fn model_backed_decide(
    ctx: &DecisionContext,
    model: Option<&dyn PredictionModel>,
    fallback: &dyn DecisionStrategy,
    strategy_name: &str,
    project: impl FnOnce(&SystemState, capfox_domain_models::ResourceImpact) -> SystemState,
) -> DecisionResult {
    if ctx.current_state.is_none() || ctx.thresholds.is_none() {
        return DecisionResult::fail_open(strategy_name);
    }
    let confidence = model.map(|m| m.confidence(&ctx.task_name)).unwrap_or(0.0);
    if confidence == 0.0 || ctx.prediction.is_none() {
        let mut result = fallback.decide(ctx, model);
        result.reasons.push("insufficient_data".to_string());
        return result;
    }

    let current = ctx.current_state.as_ref().unwrap();
    let thresholds = ctx.thresholds.as_ref().unwrap();
    let prediction = ctx.prediction.unwrap();
    let future = project(current, prediction);
    let reasons = violations_against_future(&future, thresholds);
    let allowed = reasons.is_empty();

    DecisionResult {
        allowed,
        reasons,
        predicted_state: Some(future),
        confidence,
        strategy_name: strategy_name.to_string(),
        model_name: model.map(|m| m.name().to_string()).unwrap_or_else(|| "none".to_string()),
    }
}
