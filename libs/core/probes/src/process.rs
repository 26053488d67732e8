//! Process probe: process/thread counts plus the context-switch rate.
//!
//! The rate requires two samples: the first call after construction yields
//! zero, subsequent calls yield `Δcounter / Δwall-time`.

use crate::{Probe, ProbeError, ProbeOutput};
use std::time::Instant;
use sysinfo::System;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ProcessSample {
    pub processes: u64,
    pub threads: u64,
    pub context_switches_per_second: f64,
}

pub struct ProcessProbe {
    system: System,
    last_sample: Option<(u64, Instant)>,
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            last_sample: None,
        }
    }

    /// Total context switches since boot, read from `/proc/stat`'s `ctxt`
    /// line. Returns `None` off Linux or if the file is unreadable, which
    /// the caller folds into a zero rate rather than an error.
    fn read_context_switch_counter() -> Option<u64> {
        let contents = std::fs::read_to_string("/proc/stat").ok()?;
        for line in contents.lines() {
            if let Some(rest) = line.strip_prefix("ctxt ") {
                return rest.trim().parse::<u64>().ok();
            }
        }
        None
    }
}

impl Probe for ProcessProbe {
    fn name(&self) -> &str {
        "process"
    }

    fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
        self.system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        let processes = self.system.processes().len() as u64;
        let threads: u64 = self
            .system
            .processes()
            .values()
            .map(|p| p.tasks().map(|t| t.len() as u64).unwrap_or(1))
            .sum();

        let now = Instant::now();
        let rate = match (Self::read_context_switch_counter(), self.last_sample) {
            (Some(counter), Some((last_counter, last_time))) => {
                let elapsed = now.duration_since(last_time).as_secs_f64();
                if elapsed > 0.0 {
                    (counter.saturating_sub(last_counter)) as f64 / elapsed
                } else {
                    0.0
                }
            }
            (Some(counter), None) => {
                self.last_sample = Some((counter, now));
                0.0
            }
            (None, _) => {
                debug!("context switch counter unavailable, reporting zero rate");
                0.0
            }
        };

        if let Some(counter) = Self::read_context_switch_counter() {
            self.last_sample = Some((counter, now));
        }

        Ok(ProbeOutput::Process(ProcessSample {
            processes,
            threads,
            context_switches_per_second: rate,
        }))
    }
}
