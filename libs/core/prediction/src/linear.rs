//! Incremental ordinary least squares per task.

use crate::welford::WelfordRegression;
use crate::{LearningType, ModelError, ModelStats, PredictionModel};
use capfox_domain_models::{ResourceCoefficients, ResourceImpact, TaskStatsPerTask};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct TaskRegression {
    cpu: WelfordRegression,
    memory: WelfordRegression,
    gpu: WelfordRegression,
    vram: WelfordRegression,
}

impl TaskRegression {
    fn update(&mut self, complexity: f64, impact: ResourceImpact) {
        self.cpu.update(complexity, impact.cpu);
        self.memory.update(complexity, impact.memory);
        self.gpu.update(complexity, impact.gpu);
        self.vram.update(complexity, impact.vram);
    }

    fn count(&self) -> u64 {
        self.cpu.count
    }

    fn predict(&self, complexity: f64) -> ResourceImpact {
        let (a_cpu, b_cpu) = self.cpu.fit();
        let (a_mem, b_mem) = self.memory.fit();
        let (a_gpu, b_gpu) = self.gpu.fit();
        let (a_vram, b_vram) = self.vram.fit();
        ResourceImpact {
            cpu: a_cpu * complexity + b_cpu,
            memory: a_mem * complexity + b_mem,
            gpu: a_gpu * complexity + b_gpu,
            vram: a_vram * complexity + b_vram,
        }
    }

    fn coefficients(&self) -> ResourceCoefficients {
        ResourceCoefficients {
            cpu: self.cpu.fit(),
            memory: self.memory.fit(),
            gpu: self.gpu.fit(),
            vram: self.vram.fit(),
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct PersistedState {
    tasks: HashMap<String, TaskRegression>,
}

pub struct LinearModel {
    min_observations: u64,
    tasks: RwLock<HashMap<String, TaskRegression>>,
}

impl LinearModel {
    pub fn new(min_observations: u64) -> Self {
        Self {
            min_observations: min_observations.max(2),
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for LinearModel {
    fn default() -> Self {
        Self::new(2)
    }
}

impl PredictionModel for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::Online
    }

    fn predict(&self, task: &str, complexity: u64) -> Option<ResourceImpact> {
        let tasks = self.tasks.read().unwrap();
        let regression = tasks.get(task)?;
        if regression.count() < self.min_observations {
            return None;
        }
        Some(regression.predict(complexity as f64))
    }

    fn observe(&self, task: &str, complexity: u64, impact: ResourceImpact) {
        let mut tasks = self.tasks.write().unwrap();
        tasks
            .entry(task.to_string())
            .or_default()
            .update(complexity as f64, impact);
    }

    fn confidence(&self, task: &str) -> f64 {
        let tasks = self.tasks.read().unwrap();
        let Some(regression) = tasks.get(task) else {
            return 0.0;
        };
        let count = regression.count();
        if count < self.min_observations {
            return 0.0;
        }
        let excess = (count - self.min_observations) as f64;
        let mut confidence = 0.5 + 0.5 * (1.0 - (-excess / 10.0).exp());
        if regression.cpu.is_degenerate() {
            confidence *= 0.5;
        }
        confidence.clamp(0.0, 1.0)
    }

    fn stats(&self) -> ModelStats {
        let tasks = self.tasks.read().unwrap();
        ModelStats {
            name: self.name().to_string(),
            learning_type: self.learning_type(),
            tracked_tasks: tasks.len(),
            total_observations: tasks.values().map(|t| t.count()).sum(),
        }
    }

    fn task_stats(&self, task: &str) -> Option<TaskStatsPerTask> {
        let tasks = self.tasks.read().unwrap();
        tasks.get(task).map(|t| TaskStatsPerTask {
            observation_count: t.count(),
            coefficients: Some(t.coefficients()),
        })
    }

    fn needs_retrain(&self) -> bool {
        false
    }

    fn retrain(&self) {}

    fn save(&self, sink: &mut dyn Write) -> Result<(), ModelError> {
        let tasks = self.tasks.read().unwrap();
        let persisted = PersistedState {
            tasks: tasks.clone(),
        };
        serde_json::to_writer(sink, &persisted)?;
        Ok(())
    }

    fn load(&self, source: &mut dyn Read) -> Result<(), ModelError> {
        let mut buf = String::new();
        source.read_to_string(&mut buf)?;
        if buf.trim().is_empty() {
            return Ok(());
        }
        let persisted: PersistedState = serde_json::from_str(&buf)?;
        *self.tasks.write().unwrap() = persisted.tasks;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_slope_and_intercept_within_tolerance() {
        let model = LinearModel::new(2);
        for c in [50u64, 100, 150, 200, 250] {
            let impact = ResourceImpact {
                cpu: 0.1 * c as f64,
                ..Default::default()
            };
            model.observe("enc", c, impact);
        }
        let stats = model.task_stats("enc").unwrap();
        let (a, b) = stats.coefficients.unwrap().cpu;
        assert!((a - 0.1).abs() / 0.1 < 0.01);
        assert!(b.abs() < 1.0);
    }

    #[test]
    fn below_min_observations_yields_no_prediction_and_zero_confidence() {
        let model = LinearModel::new(3);
        model.observe("t", 10, ResourceImpact { cpu: 1.0, ..Default::default() });
        assert!(model.predict("t", 10).is_none());
        assert_eq!(model.confidence("t"), 0.0);
    }

    #[test]
    fn degenerate_variance_halves_confidence() {
        let model = LinearModel::new(2);
        for _ in 0..5 {
            model.observe("t", 10, ResourceImpact { cpu: 5.0, ..Default::default() });
        }
        let stats = model.task_stats("t").unwrap();
        let (a, _b) = stats.coefficients.unwrap().cpu;
        assert_eq!(a, 0.0);
    }

    #[test]
    fn clamps_min_observations_up_to_two() {
        let model = LinearModel::new(0);
        model.observe("t", 1, ResourceImpact::default());
        assert!(model.predict("t", 1).is_none());
    }

    #[test]
    fn save_then_load_preserves_predictions() {
        let model = LinearModel::new(2);
        for c in [10u64, 20, 30] {
            model.observe("t", c, ResourceImpact { cpu: c as f64 * 2.0, ..Default::default() });
        }
        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();

        let restored = LinearModel::new(2);
        restored.load(&mut buf.as_slice()).unwrap();

        let before = model.predict("t", 40).unwrap();
        let after = restored.predict("t", 40).unwrap();
        assert!((before.cpu - after.cpu).abs() < 1e-6);
    }
}
