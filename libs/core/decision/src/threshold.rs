//! Evaluates *current* state against thresholds. No model
//! involved, so confidence is always 1.0.

use crate::DecisionStrategy;
use capfox_core_prediction::PredictionModel;
use capfox_domain_models::{DecisionContext, DecisionResult};

#[derive(Debug, Default)]
pub struct ThresholdStrategy;

impl DecisionStrategy for ThresholdStrategy {
    fn name(&self) -> &str {
        "threshold"
    }

    fn decide(&self, ctx: &DecisionContext, _model: Option<&dyn PredictionModel>) -> DecisionResult {
        let (Some(current), Some(thresholds)) = (&ctx.current_state, &ctx.thresholds) else {
            return DecisionResult::fail_open(self.name());
        };

        let mut reasons = Vec::new();
        if current.cpu.overall_percent > thresholds.cpu_max_percent {
            reasons.push("cpu_overload".to_string());
        }
        if current.memory.percent > thresholds.memory_max_percent {
            reasons.push("memory_overload".to_string());
        }
        for gpu in &current.gpus {
            if gpu.utilization_percent > thresholds.gpu_max_percent {
                reasons.push("gpu_overload".to_string());
                break;
            }
        }
        for gpu in &current.gpus {
            if gpu.vram_percent() > thresholds.vram_max_percent {
                reasons.push("vram_overload".to_string());
                break;
            }
        }
        for mount in current.storage.values() {
            if mount.free_gb() < thresholds.storage_min_free_gb {
                reasons.push("storage_low".to_string());
                break;
            }
        }

        DecisionResult {
            allowed: reasons.is_empty(),
            reasons,
            predicted_state: None,
            confidence: 1.0,
            strategy_name: self.name().to_string(),
            model_name: "none".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capfox_domain_models::{CpuState, GpuState, MemoryState, StorageMount, SystemState, Thresholds};
    use std::collections::HashMap;

    fn ctx_with(state: SystemState, thresholds: Thresholds) -> DecisionContext {
        DecisionContext {
            task_name: "t".to_string(),
            complexity: 1,
            client_hints: None,
            current_state: Some(state),
            prediction: None,
            thresholds: Some(thresholds),
            safety_buffer: 0.0,
            pending_tasks: Vec::new(),
        }
    }

    #[test]
    fn null_state_fails_open() {
        let ctx = DecisionContext {
            task_name: "t".to_string(),
            complexity: 1,
            client_hints: None,
            current_state: None,
            prediction: None,
            thresholds: None,
            safety_buffer: 0.0,
            pending_tasks: Vec::new(),
        };
        let result = ThresholdStrategy.decide(&ctx, None);
        assert!(result.allowed);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn cpu_overload_reason_appended_on_violation() {
        let mut state = SystemState::empty();
        state.cpu = CpuState::new(95.0, vec![]);
        let ctx = ctx_with(state, Thresholds { cpu_max_percent: 80.0, ..Thresholds::default() });
        let result = ThresholdStrategy.decide(&ctx, None);
        assert!(!result.allowed);
        assert_eq!(result.reasons, vec!["cpu_overload"]);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn gpu_overload_breaks_on_first_violating_device() {
        let mut state = SystemState::empty();
        state.gpus = vec![
            GpuState { index: 0, name: "a".into(), utilization_percent: 95.0, vram_used_bytes: 0, vram_total_bytes: 1, temperature_celsius: 0.0 },
            GpuState { index: 1, name: "b".into(), utilization_percent: 99.0, vram_used_bytes: 0, vram_total_bytes: 1, temperature_celsius: 0.0 },
        ];
        let ctx = ctx_with(state, Thresholds { gpu_max_percent: 90.0, ..Thresholds::default() });
        let result = ThresholdStrategy.decide(&ctx, None);
        assert_eq!(result.reasons, vec!["gpu_overload"]);
    }

    #[test]
    fn storage_low_detected() {
        let mut state = SystemState::empty();
        let mut storage = HashMap::new();
        storage.insert("/".to_string(), StorageMount::new(990, 1000));
        state.storage = storage;
        let ctx = ctx_with(state, Thresholds { storage_min_free_gb: 1.0, ..Thresholds::default() });
        let result = ThresholdStrategy.decide(&ctx, None);
        assert_eq!(result.reasons, vec!["storage_low"]);
    }

    #[test]
    fn no_violations_allows() {
        let state = SystemState::empty();
        let ctx = ctx_with(state, Thresholds::default());
        let result = ThresholdStrategy.decide(&ctx, None);
        assert!(result.allowed);
        assert!(result.reasons.is_empty());
    }
}
