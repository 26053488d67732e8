//! In-flight task bookkeeping shared by the learning engine and the
//! queue-aware decision strategy.

use crate::{impact::ResourceImpact, system_state::SystemState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task between `notify` and `observe` (C4), or between submission and
/// completion in the pending queue (C8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTask {
    pub id: String,
    pub task_name: String,
    pub complexity: u64,
    pub started_at: DateTime<Utc>,
    pub baseline_state: SystemState,
    pub predicted_impact: Option<ResourceImpact>,
}

/// Running statistics a prediction model keeps per task. Not every field is
/// meaningful for every model variant; `coefficients` is only populated by
/// models that fit `impact ≈ a * complexity + b` (linear, polynomial,
/// gradient-boost).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStatsPerTask {
    pub observation_count: u64,
    pub coefficients: Option<ResourceCoefficients>,
}

/// Fitted `(a, b)` per resource such that `impact ≈ a * complexity + b`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResourceCoefficients {
    pub cpu: (f64, f64),
    pub memory: (f64, f64),
    pub gpu: (f64, f64),
    pub vram: (f64, f64),
}
