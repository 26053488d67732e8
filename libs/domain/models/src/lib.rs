//! Shared data types for the capfox admission controller, exchanged between
//! the probes, aggregator, prediction, learning and decision crates and
//! serialised at the HTTP boundary.

pub mod decision;
pub mod impact;
pub mod system_state;
pub mod task;
pub mod thresholds;

pub use decision::{ClientHints, DecisionContext, DecisionResult};
pub use impact::ResourceImpact;
pub use system_state::{CpuState, GpuState, MemoryState, StorageMount, SystemState};
pub use task::{PendingTask, ResourceCoefficients, TaskStatsPerTask};
pub use thresholds::Thresholds;

/// Clamps a percent value into `[0, 100]`. Used throughout the data model to
/// satisfy the invariant that every percent field stays in range even when
/// upstream sensors report out-of-bound noise.
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
