use candle_core::{CudaDevice, Device};

use crate::core::ModelOptions;

/// Loads a device for a model.
///
/// `Some(i)` requires CUDA device `i`. `None` tries CUDA 0 and falls back to CPU.
pub fn load_device_with(index: Option<usize>) -> anyhow::Result<Device> {
    if let Some(i) = index {
        return Ok(Device::Cuda(CudaDevice::new_with_stream(i)?));
    }
    match CudaDevice::new_with_stream(0) {
        Ok(cuda_device) => Ok(Device::Cuda(cuda_device)),
        Err(_) => {
            tracing::debug!("CUDA unavailable, using CPU");
            Ok(Device::Cpu)
        }
    }
}

/// Device choice recorded by pipeline builders and resolved at build time.
#[derive(Clone, Default)]
pub enum DeviceRequest {
    /// CUDA 0 when available, otherwise CPU.
    #[default]
    Default,
    Cpu,
    Cuda(usize),
    Explicit(Device),
}

impl DeviceRequest {
    pub fn resolve(self) -> anyhow::Result<Device> {
        match self {
            DeviceRequest::Default => load_device_with(None),
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => load_device_with(Some(i)),
            DeviceRequest::Explicit(d) => Ok(d),
        }
    }
}

/// Device selection shared by the pipeline builders.
pub trait DeviceSelectable: Sized {
    fn device_request_mut(&mut self) -> &mut DeviceRequest;

    /// Force CPU even if CUDA is available.
    fn cpu(mut self) -> Self {
        *self.device_request_mut() = DeviceRequest::Cpu;
        self
    }

    fn cuda_device(mut self, index: usize) -> Self {
        *self.device_request_mut() = DeviceRequest::Cuda(index);
        self
    }

    fn device(mut self, device: Device) -> Self {
        *self.device_request_mut() = DeviceRequest::Explicit(device);
        self
    }
}

/// Cache key combining model options and device location.
pub fn build_cache_key<O: ModelOptions>(options: &O, device: &Device) -> String {
    format!("{}-{:?}", options.cache_key(), device.location())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModernBertSize;

    struct Builder {
        device_request: DeviceRequest,
    }

    impl DeviceSelectable for Builder {
        fn device_request_mut(&mut self) -> &mut DeviceRequest {
            &mut self.device_request
        }
    }

    #[test]
    fn cpu_request_resolves_to_cpu() {
        let builder = Builder {
            device_request: DeviceRequest::Default,
        }
        .cpu();
        let device = builder.device_request.resolve().unwrap();
        assert!(matches!(device, Device::Cpu));
    }

    #[test]
    fn cache_key_includes_options_and_device() {
        let key = build_cache_key(&ModernBertSize::Base, &Device::Cpu);
        assert!(key.starts_with("modernbert-base-"));
        assert!(key.contains("Cpu"));
    }
}
