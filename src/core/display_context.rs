use std::sync::Arc;
use wgpu::{Surface, SurfaceConfiguration, SurfaceTexture, TextureFormat};
use winit::window::Window;

use super::blit::TextureBlit;
use super::gpu_context::GpuContext;
use crate::core::window::{ClientRect, WindowContext};
use crate::error::{RenderError, Result};
use crate::render::{FramePresenter, PixelLayout};

/// Display context - the window's presentation surface shared by all renderers
///
/// Holds the window, its configured wgpu surface and the device that drives
/// it. Renderers only read from it; resizing happens between frames.
pub struct DisplayContext {
    window: Arc<Window>,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    gpu: Arc<GpuContext>,
}

impl DisplayContext {
    /// Create the surface for `window` and a device able to present to it
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = ClientRect::from(window.inner_size());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let gpu = Arc::new(GpuContext::new_with_surface(&instance, &surface).await?);

        let caps = surface.get_capabilities(gpu.adapter());
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(RenderError::UnsupportedSurface)?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &config);

        log::info!("display surface {}x{} ({:?})", config.width, config.height, format);

        Ok(Self {
            window,
            surface,
            config,
            gpu,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    pub fn format(&self) -> TextureFormat {
        self.config.format
    }

    /// Size the surface is configured for
    pub fn surface_size(&self) -> ClientRect {
        ClientRect::new(self.config.width, self.config.height)
    }

    /// Reconfigure the surface for a new client area; empty sizes are ignored
    pub fn resize(&mut self, rect: ClientRect) {
        if rect.is_empty() {
            return;
        }

        self.config.width = rect.width;
        self.config.height = rect.height;
        self.surface.configure(self.gpu.device(), &self.config);
    }

    /// Next frame to draw into; a lost or outdated surface is reconfigured once
    pub fn acquire_frame(&self) -> Result<SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                self.surface.configure(self.gpu.device(), &self.config);
                Ok(self.surface.get_current_texture()?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl WindowContext for DisplayContext {
    fn client_rect(&self) -> ClientRect {
        self.window.client_rect()
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl FramePresenter for DisplayContext {
    type Target = TextureBlit;

    fn create_target(&self, layout: PixelLayout, rect: ClientRect) -> Result<TextureBlit> {
        Ok(TextureBlit::new(self.gpu.clone(), self.format(), layout, rect))
    }

    fn resize_target(&self, target: &mut TextureBlit, rect: ClientRect) -> Result<()> {
        target.resize(rect);
        Ok(())
    }

    fn present(&self, target: &mut TextureBlit, pixels: &[u8], bytes_per_row: u32) -> Result<()> {
        target.upload(pixels, bytes_per_row)?;

        let frame = self.acquire_frame()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });
        target.draw(&mut encoder, &view);

        self.gpu.queue().submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
