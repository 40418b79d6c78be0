use std::sync::Arc;
use wgpu::{Adapter, Device, DeviceDescriptor, Features, Instance, Limits, Queue, Surface, TextureFormat};

use crate::error::Result;

/// Multisample count the GPU backend asks for
pub const PREFERRED_SAMPLE_COUNT: u32 = 4;

/// Shared GPU context for the window and every renderer that draws into it
///
/// Device and queue are reference counted so renderers can keep their own
/// handle without each needing their own GPU context.
#[derive(Clone)]
pub struct GpuContext {
    adapter: Arc<Adapter>,
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a GPU context compatible with a surface (for window rendering)
    ///
    /// The surface must come from `instance`.
    pub async fn new_with_surface(instance: &Instance, surface: &Surface<'_>) -> Result<Self> {
        let adapter = Self::request_adapter(instance, surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        Ok(Self {
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Get reference to the device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Get reference to the queue
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Largest supported sample count not above [`PREFERRED_SAMPLE_COUNT`]
    pub fn sample_count(&self, format: TextureFormat) -> u32 {
        let flags = self.adapter.get_texture_format_features(format).flags;
        [PREFERRED_SAMPLE_COUNT, 2]
            .into_iter()
            .find(|&count| flags.sample_count_supported(count))
            .unwrap_or(1)
    }

    /// Request adapter with surface compatibility
    async fn request_adapter(instance: &Instance, surface: &Surface<'_>) -> Result<Adapter> {
        Ok(instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await?)
    }

    /// Request device and queue
    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        let supported_features = adapter.features();
        let mut requested_features = Features::empty();

        // Per-adapter format features expose multisampling beyond the baseline
        if supported_features.contains(Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            requested_features |= Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let limits = Limits::downlevel_defaults().using_resolution(adapter.limits());

        Ok(adapter
            .request_device(&DeviceDescriptor {
                label: Some("Clock Device"),
                required_features: requested_features,
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await?)
    }
}
