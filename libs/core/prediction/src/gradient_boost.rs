//! Batch model. `Observe` only accumulates; predictions stay unavailable
//! until the first `Retrain`. The shipped fit is ordinary least squares per
//! dirty task per resource rather than a boosted-tree ensemble; the
//! configuration surface (buffer, retrain interval) is kept tree-shaped for
//! a future real fit without changing callers.

use crate::buffer::BoundedBuffer;
use crate::polyfit::fit_polynomial;
use crate::{saturating_confidence, LearningType, ModelError, ModelStats, PredictionModel};
use capfox_domain_models::{ResourceCoefficients, ResourceImpact, TaskStatsPerTask};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::RwLock;
use std::time::Duration;

const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Sample {
    complexity: f64,
    impact: ResourceImpact,
}

#[derive(Clone, Serialize, Deserialize)]
struct TaskState {
    samples: BoundedBuffer<Sample>,
    dirty: bool,
    fitted: Option<ResourceCoefficients>,
}

impl TaskState {
    fn new(capacity: usize) -> Self {
        Self {
            samples: BoundedBuffer::new(capacity),
            dirty: false,
            fitted: None,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct PersistedState {
    tasks: HashMap<String, TaskStatePersisted>,
    last_retrain: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct TaskStatePersisted {
    capacity: usize,
    samples: Vec<Sample>,
    dirty: bool,
    fitted: Option<ResourceCoefficients>,
}

struct Inner {
    tasks: HashMap<String, TaskState>,
    last_retrain: Option<DateTime<Utc>>,
}

pub struct GradientBoostModel {
    min_observations: u64,
    buffer_capacity: usize,
    retrain_interval: Duration,
    inner: RwLock<Inner>,
}

impl GradientBoostModel {
    pub fn new(min_observations: u64, buffer_capacity: usize, retrain_interval: Duration) -> Self {
        Self {
            min_observations: min_observations.max(1),
            buffer_capacity: if buffer_capacity == 0 {
                DEFAULT_BUFFER_CAPACITY
            } else {
                buffer_capacity
            },
            retrain_interval,
            inner: RwLock::new(Inner {
                tasks: HashMap::new(),
                last_retrain: None,
            }),
        }
    }
}

impl Default for GradientBoostModel {
    fn default() -> Self {
        Self::new(5, DEFAULT_BUFFER_CAPACITY, Duration::from_secs(3600))
    }
}

fn fit_resource(samples: &[Sample], extract: impl Fn(&ResourceImpact) -> f64) -> (f64, f64) {
    let points: Vec<(f64, f64)> = samples.iter().map(|s| (s.complexity, extract(&s.impact))).collect();
    let coeffs = fit_polynomial(&points, 1);
    (coeffs.get(1).copied().unwrap_or(0.0), coeffs.first().copied().unwrap_or(0.0))
}

impl PredictionModel for GradientBoostModel {
    fn name(&self) -> &str {
        "gradient-boost"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::Batch
    }

    fn predict(&self, task: &str, complexity: u64) -> Option<ResourceImpact> {
        let inner = self.inner.read().unwrap();
        let fitted = inner.tasks.get(task)?.fitted?;
        let x = complexity as f64;
        Some(ResourceImpact {
            cpu: fitted.cpu.0 * x + fitted.cpu.1,
            memory: fitted.memory.0 * x + fitted.memory.1,
            gpu: fitted.gpu.0 * x + fitted.gpu.1,
            vram: fitted.vram.0 * x + fitted.vram.1,
        })
    }

    fn observe(&self, task: &str, complexity: u64, impact: ResourceImpact) {
        let mut inner = self.inner.write().unwrap();
        let capacity = self.buffer_capacity;
        let state = inner
            .tasks
            .entry(task.to_string())
            .or_insert_with(|| TaskState::new(capacity));
        state.samples.push(Sample {
            complexity: complexity as f64,
            impact,
        });
        state.dirty = true;
    }

    fn confidence(&self, task: &str) -> f64 {
        let inner = self.inner.read().unwrap();
        let Some(state) = inner.tasks.get(task) else {
            return 0.0;
        };
        if state.fitted.is_none() {
            return 0.0;
        }
        saturating_confidence(state.samples.len() as u64, 10.0)
    }

    fn stats(&self) -> ModelStats {
        let inner = self.inner.read().unwrap();
        ModelStats {
            name: self.name().to_string(),
            learning_type: self.learning_type(),
            tracked_tasks: inner.tasks.len(),
            total_observations: inner.tasks.values().map(|t| t.samples.len() as u64).sum(),
        }
    }

    fn task_stats(&self, task: &str) -> Option<TaskStatsPerTask> {
        let inner = self.inner.read().unwrap();
        let state = inner.tasks.get(task)?;
        Some(TaskStatsPerTask {
            observation_count: state.samples.len() as u64,
            coefficients: state.fitted,
        })
    }

    fn needs_retrain(&self) -> bool {
        let inner = self.inner.read().unwrap();
        let interval_elapsed = match inner.last_retrain {
            None => true,
            Some(last) => {
                Utc::now().signed_duration_since(last).num_milliseconds()
                    >= self.retrain_interval.as_millis() as i64
            }
        };
        interval_elapsed
            && inner
                .tasks
                .values()
                .any(|t| t.dirty && t.samples.len() as u64 >= self.min_observations)
    }

    fn retrain(&self) {
        let mut inner = self.inner.write().unwrap();
        for state in inner.tasks.values_mut() {
            if !state.dirty || (state.samples.len() as u64) < self.min_observations {
                continue;
            }
            let samples: Vec<Sample> = state.samples.iter().copied().collect();
            state.fitted = Some(ResourceCoefficients {
                cpu: fit_resource(&samples, |r| r.cpu),
                memory: fit_resource(&samples, |r| r.memory),
                gpu: fit_resource(&samples, |r| r.gpu),
                vram: fit_resource(&samples, |r| r.vram),
            });
            state.dirty = false;
        }
        inner.last_retrain = Some(Utc::now());
    }

    fn save(&self, sink: &mut dyn Write) -> Result<(), ModelError> {
        let inner = self.inner.read().unwrap();
        let persisted = PersistedState {
            tasks: inner
                .tasks
                .iter()
                .map(|(name, state)| {
                    (
                        name.clone(),
                        TaskStatePersisted {
                            capacity: self.buffer_capacity,
                            samples: state.samples.iter().copied().collect(),
                            dirty: state.dirty,
                            fitted: state.fitted,
                        },
                    )
                })
                .collect(),
            last_retrain: inner.last_retrain,
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
        let mut inner = self.inner.write().unwrap();
        inner.tasks.clear();
        for (name, task) in persisted.tasks {
            let mut samples = BoundedBuffer::new(task.capacity);
            for sample in task.samples {
                samples.push(sample);
            }
            inner.tasks.insert(
                name,
                TaskState {
                    samples,
                    dirty: task.dirty,
                    fitted: task.fitted,
                },
            );
        }
        inner.last_retrain = persisted.last_retrain;
        Ok(())
    }
}
