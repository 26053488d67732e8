//! C3: the `PredictionModel` trait and its four concrete variants.

pub mod gradient_boost;
pub mod linear;
pub mod moving_average;
pub mod noop;
pub mod polynomial;
mod welford;

pub use gradient_boost::GradientBoostModel;
pub use linear::LinearModel;
pub use moving_average::MovingAverageModel;
pub use noop::NoopModel;
pub use polynomial::PolynomialModel;

use capfox_domain_models::{ResourceImpact, TaskStatsPerTask};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningType {
    Online,
    Batch,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to serialise model state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to read model state: {0}")]
    Io(#[from] std::io::Error),
}

/// Aggregate, model-wide statistics exposed at `/v2/model/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStats {
    pub name: String,
    pub learning_type: LearningType,
    pub tracked_tasks: usize,
    pub total_observations: u64,
}

/// Uniform prediction-model contract. Every method takes `&self`
/// — implementations hold their per-task state behind an internal
/// reader-writer lock so `Observe` can take the writer while `Predict`,
/// `Confidence` and `Stats` take the reader, and so the model can
/// be shared as `Arc<dyn PredictionModel>` across the learning and decision
/// engines without an outer lock.
pub trait PredictionModel: Send + Sync {
    fn name(&self) -> &str;
    fn learning_type(&self) -> LearningType;
    fn predict(&self, task: &str, complexity: u64) -> Option<ResourceImpact>;
    fn observe(&self, task: &str, complexity: u64, impact: ResourceImpact);
    fn confidence(&self, task: &str) -> f64;
    fn stats(&self) -> ModelStats;
    fn task_stats(&self, task: &str) -> Option<TaskStatsPerTask>;
    fn needs_retrain(&self) -> bool;
    fn retrain(&self);
    fn save(&self, sink: &mut dyn Write) -> Result<(), ModelError>;
    fn load(&self, source: &mut dyn Read) -> Result<(), ModelError>;
}

/// `1 - exp(-count / scale)`, clamped to `[0, 1]`. Shared by every online
/// model's confidence curve so doubling observation count never lowers
/// confidence and the asymptote is exactly 1.
pub fn saturating_confidence(count: u64, scale: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (1.0 - (-(count as f64) / scale).exp()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_zero_observations_is_zero() {
        assert_eq!(saturating_confidence(0, 5.0), 0.0);
    }

    #[test]
    fn confidence_rises_monotonically() {
        let mut prev = 0.0;
        for n in 1..50 {
            let c = saturating_confidence(n, 5.0);
            assert!(c >= prev);
            prev = c;
        }
    }

    #[test]
    fn confidence_capped_at_one() {
        assert!(saturating_confidence(1_000_000, 5.0) <= 1.0);
    }
}
