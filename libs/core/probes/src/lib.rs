//! C1: named collectors, each reporting a slice of system state.
//!
//! A probe never fails the whole aggregation tick — the aggregator logs a
//! probe's error and substitutes a zeroed/empty substate for that tick
//! instead.

pub mod cpu;
pub mod gpu;
pub mod memory;
pub mod process;
pub mod storage;

pub use cpu::CpuProbe;
pub use gpu::GpuProbe;
pub use memory::MemoryProbe;
pub use process::{ProcessProbe, ProcessSample};
pub use storage::StorageProbe;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe '{0}' collection failed: {1}")]
    CollectionFailed(String, String),
}

/// One output variant per probe. The aggregator matches on this to fold the
/// result into the next `SystemState`.
#[derive(Debug, Clone)]
pub enum ProbeOutput {
    Cpu(capfox_domain_models::CpuState),
    Memory(capfox_domain_models::MemoryState),
    Storage(std::collections::HashMap<String, capfox_domain_models::StorageMount>),
    Gpu(Vec<capfox_domain_models::GpuState>),
    Process(ProcessSample),
}

/// Uniform probe contract: a name for logging and a fallible
/// collect that may hold `&mut self` state (the process probe needs it for
/// the context-switch rate).
pub trait Probe: Send {
    fn name(&self) -> &str;
    fn collect(&mut self) -> Result<ProbeOutput, ProbeError>;
}
