//! A predicted or observed delta in resource usage attributable to a task.

use serde::{Deserialize, Serialize};

/// Signed percent deltas. No storage delta is modelled — disk usage is
/// slow-moving and not worth predicting per task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceImpact {
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
    pub vram: f64,
}

impl ResourceImpact {
    pub const ZERO: ResourceImpact = ResourceImpact {
        cpu: 0.0,
        memory: 0.0,
        gpu: 0.0,
        vram: 0.0,
    };

    /// Scales every component by `1.0 + fraction`, used by the conservative
    /// strategy's safety buffer.
    pub fn scaled(&self, fraction: f64) -> ResourceImpact {
        let factor = 1.0 + fraction;
        ResourceImpact {
            cpu: self.cpu * factor,
            memory: self.memory * factor,
            gpu: self.gpu * factor,
            vram: self.vram * factor,
        }
    }

    pub fn add(&self, other: &ResourceImpact) -> ResourceImpact {
        ResourceImpact {
            cpu: self.cpu + other.cpu,
            memory: self.memory + other.memory,
            gpu: self.gpu + other.gpu,
            vram: self.vram + other.vram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_applies_safety_buffer() {
        let impact = ResourceImpact {
            cpu: 10.0,
            memory: 20.0,
            gpu: 0.0,
            vram: 0.0,
        };
        let scaled = impact.scaled(0.10);
        assert!((scaled.cpu - 11.0).abs() < 1e-9);
        assert!((scaled.memory - 22.0).abs() < 1e-9);
    }

    #[test]
    fn add_sums_components() {
        let a = ResourceImpact { cpu: 1.0, memory: 2.0, gpu: 3.0, vram: 4.0 };
        let b = ResourceImpact { cpu: 10.0, memory: 10.0, gpu: 10.0, vram: 10.0 };
        let sum = a.add(&b);
        assert_eq!(sum.cpu, 11.0);
        assert_eq!(sum.vram, 14.0);
    }
}
