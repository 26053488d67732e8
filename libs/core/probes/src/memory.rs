//! Memory probe: used/total bytes, percent derived by the domain type.

use crate::{Probe, ProbeError, ProbeOutput};
use capfox_domain_models::MemoryState;
use sysinfo::System;

pub struct MemoryProbe {
    system: System,
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Probe for MemoryProbe {
    fn name(&self) -> &str {
        "memory"
    }

    fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
        self.system.refresh_memory();
        Ok(ProbeOutput::Memory(MemoryState::new(
            self.system.used_memory(),
            self.system.total_memory(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_memory_state() {
        let mut probe = MemoryProbe::new();
        let output = probe.collect().unwrap();
        match output {
            ProbeOutput::Memory(state) => assert!(state.used_bytes <= state.total_bytes),
            _ => panic!("expected ProbeOutput::Memory"),
        }
    }
}
