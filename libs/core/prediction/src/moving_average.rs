//! Exponential moving average per task, ignoring complexity in prediction.

use crate::{saturating_confidence, LearningType, ModelError, ModelStats, PredictionModel};
use capfox_domain_models::{ResourceImpact, TaskStatsPerTask};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct TaskAverage {
    count: u64,
    average: ResourceImpact,
}

#[derive(Default, Serialize, Deserialize)]
struct PersistedState {
    tasks: HashMap<String, TaskAverage>,
}

pub struct MovingAverageModel {
    alpha: f64,
    tasks: RwLock<HashMap<String, TaskAverage>>,
}

impl MovingAverageModel {
    /// `alpha` is the smoothing factor in `(0, 1]`; out-of-range values fall
    /// back to the documented default of 0.2.
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha > 0.0 && alpha <= 1.0 { alpha } else { 0.2 };
        Self {
            alpha,
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MovingAverageModel {
    fn default() -> Self {
        Self::new(0.2)
    }
}

fn blend(alpha: f64, prev: ResourceImpact, x: ResourceImpact) -> ResourceImpact {
    ResourceImpact {
        cpu: alpha * x.cpu + (1.0 - alpha) * prev.cpu,
        memory: alpha * x.memory + (1.0 - alpha) * prev.memory,
        gpu: alpha * x.gpu + (1.0 - alpha) * prev.gpu,
        vram: alpha * x.vram + (1.0 - alpha) * prev.vram,
    }
}

impl PredictionModel for MovingAverageModel {
    fn name(&self) -> &str {
        "moving-average"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::Online
    }

    fn predict(&self, task: &str, _complexity: u64) -> Option<ResourceImpact> {
        let tasks = self.tasks.read().unwrap();
        tasks.get(task).filter(|t| t.count > 0).map(|t| t.average)
    }

    fn observe(&self, task: &str, _complexity: u64, impact: ResourceImpact) {
        let mut tasks = self.tasks.write().unwrap();
        let entry = tasks.entry(task.to_string()).or_default();
        entry.average = if entry.count == 0 {
            impact
        } else {
            blend(self.alpha, entry.average, impact)
        };
        entry.count += 1;
    }

    fn confidence(&self, task: &str) -> f64 {
        let tasks = self.tasks.read().unwrap();
        match tasks.get(task) {
            Some(t) if t.count > 0 => saturating_confidence(t.count, 5.0),
            _ => 0.0,
        }
    }

    fn stats(&self) -> ModelStats {
        let tasks = self.tasks.read().unwrap();
        ModelStats {
            name: self.name().to_string(),
            learning_type: self.learning_type(),
            tracked_tasks: tasks.len(),
            total_observations: tasks.values().map(|t| t.count).sum(),
        }
    }

    fn task_stats(&self, task: &str) -> Option<TaskStatsPerTask> {
        let tasks = self.tasks.read().unwrap();
        tasks.get(task).map(|t| TaskStatsPerTask {
            observation_count: t.count,
            coefficients: None,
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
