//! GPU probe. Degrades gracefully when no accelerator subsystem is
//! available: an empty device sequence, never an error.
//!
//! The NVML-backed collector only compiles in behind the `gpu` feature,
//! since most hosts running the test suite (and most admission-controller
//! deployments outside a GPU box) have no accelerator driver installed.

use crate::{Probe, ProbeError, ProbeOutput};

#[derive(Default)]
pub struct GpuProbe {
    #[cfg(feature = "gpu")]
    nvml: Option<nvml_wrapper::Nvml>,
}

impl GpuProbe {
    pub fn new() -> Self {
        #[cfg(feature = "gpu")]
        {
            let nvml = nvml_wrapper::Nvml::init().ok();
            Self { nvml }
        }
        #[cfg(not(feature = "gpu"))]
        {
            Self {}
        }
    }
}

impl Probe for GpuProbe {
    fn name(&self) -> &str {
        "gpu"
    }

    #[cfg(feature = "gpu")]
    fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
        use capfox_domain_models::GpuState;

        let Some(nvml) = &self.nvml else {
            return Ok(ProbeOutput::Gpu(Vec::new()));
        };

        let count = match nvml.device_count() {
            Ok(count) => count,
            Err(_) => return Ok(ProbeOutput::Gpu(Vec::new())),
        };

        let mut devices = Vec::with_capacity(count as usize);
        for index in 0..count {
            let Ok(device) = nvml.device_by_index(index) else {
                continue;
            };
            let name = device.name().unwrap_or_else(|_| "unknown".to_string());
            let utilization = device
                .utilization_rates()
                .map(|u| u.gpu as f64)
                .unwrap_or(0.0);
            let memory = device.memory_info().ok();
            let temperature = device
                .temperature(nvml_wrapper::enum_wrappers::device::TemperatureSensor::Gpu)
                .map(|t| t as f64)
                .unwrap_or(0.0);

            devices.push(GpuState {
                index: index as usize,
                name,
                utilization_percent: utilization,
                vram_used_bytes: memory.as_ref().map(|m| m.used).unwrap_or(0),
                vram_total_bytes: memory.as_ref().map(|m| m.total).unwrap_or(0),
                temperature_celsius: temperature,
            });
        }

        Ok(ProbeOutput::Gpu(devices))
    }

    #[cfg(not(feature = "gpu"))]
    fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
        Ok(ProbeOutput::Gpu(Vec::new()))
    }
}
