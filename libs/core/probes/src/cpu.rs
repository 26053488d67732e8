//! CPU probe: overall utilisation plus a per-core breakdown.

use crate::{Probe, ProbeError, ProbeOutput};
use capfox_domain_models::CpuState;
use sysinfo::System;

pub struct CpuProbe {
    system: System,
}

impl Default for CpuProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        Self { system }
    }
}

impl Probe for CpuProbe {
    fn name(&self) -> &str {
        "cpu"
    }

    fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
        self.system.refresh_cpu_usage();
        let cores: Vec<f64> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| cpu.cpu_usage() as f64)
            .collect();
        let overall = if cores.is_empty() {
            0.0
        } else {
            cores.iter().sum::<f64>() / cores.len() as f64
        };
        Ok(ProbeOutput::Cpu(CpuState::new(overall, cores)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_cpu_state() {
        let mut probe = CpuProbe::new();
        let output = probe.collect().unwrap();
        match output {
            ProbeOutput::Cpu(state) => {
                assert!(state.overall_percent >= 0.0 && state.overall_percent <= 100.0);
            }
            _ => panic!("expected ProbeOutput::Cpu"),
        }
    }
}
