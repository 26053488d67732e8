//! The always-decline model, used when prediction is disabled.

use crate::{LearningType, ModelError, ModelStats, PredictionModel};
use capfox_domain_models::{ResourceImpact, TaskStatsPerTask};
use std::io::{Read, Write};

#[derive(Debug, Default)]
pub struct NoopModel;

impl PredictionModel for NoopModel {
    fn name(&self) -> &str {
        "noop"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::Online
    }

    fn predict(&self, _task: &str, _complexity: u64) -> Option<ResourceImpact> {
        None
    }

    fn observe(&self, _task: &str, _complexity: u64, _impact: ResourceImpact) {}

    fn confidence(&self, _task: &str) -> f64 {
        0.0
    }

    fn stats(&self) -> ModelStats {
        ModelStats {
            name: self.name().to_string(),
            learning_type: self.learning_type(),
            tracked_tasks: 0,
            total_observations: 0,
        }
    }

    fn task_stats(&self, _task: &str) -> Option<TaskStatsPerTask> {
        None
    }

    fn needs_retrain(&self) -> bool {
        false
    }

    fn retrain(&self) {}

    fn save(&self, sink: &mut dyn Write) -> Result<(), ModelError> {
        sink.write_all(b"{}")?;
        Ok(())
    }

    fn load(&self, _source: &mut dyn Read) -> Result<(), ModelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_declines() {
        let model = NoopModel;
        assert!(model.predict("t", 10).is_none());
        assert_eq!(model.confidence("t"), 0.0);
    }
}
