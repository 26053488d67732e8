//! Per-task polynomial regression over a bounded sample buffer.

use crate::buffer::BoundedBuffer;
use crate::polyfit::{evaluate_polynomial, fit_polynomial};
use crate::{saturating_confidence, LearningType, ModelError, ModelStats, PredictionModel};
use capfox_domain_models::{ResourceCoefficients, ResourceImpact, TaskStatsPerTask};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::RwLock;

const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Sample {
    complexity: f64,
    impact: ResourceImpact,
}

#[derive(Clone, Serialize, Deserialize)]
struct TaskBuffer {
    samples: BoundedBuffer<Sample>,
}

impl TaskBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            samples: BoundedBuffer::new(capacity),
        }
    }

    fn fit_resource(&self, degree: usize, extract: impl Fn(&ResourceImpact) -> f64) -> Vec<f64> {
        let points: Vec<(f64, f64)> = self
            .samples
            .iter()
            .map(|s| (s.complexity, extract(&s.impact)))
            .collect();
        fit_polynomial(&points, degree)
    }
}

#[derive(Default, Serialize, Deserialize)]
struct PersistedState {
    tasks: HashMap<String, TaskBufferPersisted>,
}

#[derive(Serialize, Deserialize)]
struct TaskBufferPersisted {
    capacity: usize,
    samples: Vec<Sample>,
}

pub struct PolynomialModel {
    degree: usize,
    min_observations: u64,
    buffer_capacity: usize,
    tasks: RwLock<HashMap<String, TaskBuffer>>,
}

impl PolynomialModel {
    pub fn new(degree: usize, buffer_capacity: usize) -> Self {
        let degree = degree.clamp(1, 5);
        Self {
            degree,
            min_observations: (degree + 1) as u64,
            buffer_capacity: if buffer_capacity == 0 {
                DEFAULT_BUFFER_CAPACITY
            } else {
                buffer_capacity
            },
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for PolynomialModel {
    fn default() -> Self {
        Self::new(2, DEFAULT_BUFFER_CAPACITY)
    }
}

impl PredictionModel for PolynomialModel {
    fn name(&self) -> &str {
        "polynomial"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::Online
    }

    fn predict(&self, task: &str, complexity: u64) -> Option<ResourceImpact> {
        let tasks = self.tasks.read().unwrap();
        let buffer = tasks.get(task)?;
        if (buffer.samples.len() as u64) < self.min_observations {
            return None;
        }
        let x = complexity as f64;
        let cpu = evaluate_polynomial(&buffer.fit_resource(self.degree, |r| r.cpu), x);
        let memory = evaluate_polynomial(&buffer.fit_resource(self.degree, |r| r.memory), x);
        let gpu = evaluate_polynomial(&buffer.fit_resource(self.degree, |r| r.gpu), x);
        let vram = evaluate_polynomial(&buffer.fit_resource(self.degree, |r| r.vram), x);
        Some(ResourceImpact { cpu, memory, gpu, vram })
    }

    fn observe(&self, task: &str, complexity: u64, impact: ResourceImpact) {
        let mut tasks = self.tasks.write().unwrap();
        tasks
            .entry(task.to_string())
            .or_insert_with(|| TaskBuffer::new(self.buffer_capacity))
            .samples
            .push(Sample {
                complexity: complexity as f64,
                impact,
            });
    }

    fn confidence(&self, task: &str) -> f64 {
        let tasks = self.tasks.read().unwrap();
        let Some(buffer) = tasks.get(task) else {
            return 0.0;
        };
        let count = buffer.samples.len() as u64;
        if count < self.min_observations {
            return 0.0;
        }
        let base = saturating_confidence(count - self.min_observations + 1, 10.0);
        let degree_penalty = 1.0 / (1.0 + 0.2 * (self.degree as f64 - 1.0));
        (base * degree_penalty).clamp(0.0, 1.0)
    }

    fn stats(&self) -> ModelStats {
        let tasks = self.tasks.read().unwrap();
        ModelStats {
            name: self.name().to_string(),
            learning_type: self.learning_type(),
            tracked_tasks: tasks.len(),
            total_observations: tasks.values().map(|t| t.samples.len() as u64).sum(),
        }
    }

    fn task_stats(&self, task: &str) -> Option<TaskStatsPerTask> {
        let tasks = self.tasks.read().unwrap();
        let buffer = tasks.get(task)?;
        let coefficients = ResourceCoefficients {
            cpu: pair(&buffer.fit_resource(self.degree, |r| r.cpu)),
            memory: pair(&buffer.fit_resource(self.degree, |r| r.memory)),
            gpu: pair(&buffer.fit_resource(self.degree, |r| r.gpu)),
            vram: pair(&buffer.fit_resource(self.degree, |r| r.vram)),
        };
        Some(TaskStatsPerTask {
            observation_count: buffer.samples.len() as u64,
            coefficients: Some(coefficients),
        })
    }

    fn needs_retrain(&self) -> bool {
        false
    }

    fn retrain(&self) {}

    fn save(&self, sink: &mut dyn Write) -> Result<(), ModelError> {
        let tasks = self.tasks.read().unwrap();
        let persisted = PersistedState {
            tasks: tasks
                .iter()
                .map(|(name, buf)| {
                    (
                        name.clone(),
                        TaskBufferPersisted {
                            capacity: self.buffer_capacity,
                            samples: buf.samples.iter().copied().collect(),
                        },
                    )
                })
                .collect(),
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
        let mut tasks = self.tasks.write().unwrap();
        tasks.clear();
        for (name, task_buf) in persisted.tasks {
            let mut buffer = TaskBuffer::new(task_buf.capacity);
            for sample in task_buf.samples {
                buffer.samples.push(sample);
            }
            tasks.insert(name, buffer);
        }
        Ok(())
    }
}

/// First two coefficients as `(a, b)` for the `TaskStatsPerTask` wire shape,
/// which models a single linear slope/intercept pair even for higher-degree
/// fits (the full coefficient vector is only meaningful internally).
fn pair(coefficients: &[f64]) -> (f64, f64) {
    (
        coefficients.get(1).copied().unwrap_or(0.0),
        coefficients.first().copied().unwrap_or(0.0),
    )
}
