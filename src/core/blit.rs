use std::sync::Arc;
use wgpu::{BindGroup, Device, RenderPipeline, Sampler, Texture, TextureFormat, TextureView};

use super::gpu_context::GpuContext;
use crate::core::window::ClientRect;
use crate::error::{RenderError, Result};
use crate::render::PixelLayout;

/// Shows a CPU-rendered frame on a window surface
///
/// Pixels are uploaded into a texture of the frame's size and drawn with a
/// full-screen triangle. The texture is sampled as sRGB when the surface is,
/// so the stored bytes reach the screen unchanged.
pub struct TextureBlit {
    gpu: Arc<GpuContext>,
    pipeline: RenderPipeline,
    sampler: Sampler,
    format: TextureFormat,
    texture: Texture,
    bind_group: BindGroup,
    size: ClientRect,
}

impl TextureBlit {
    pub fn new(gpu: Arc<GpuContext>, surface_format: TextureFormat, layout: PixelLayout, size: ClientRect) -> Self {
        let format = Self::texture_format(layout, surface_format);
        let device = gpu.device();
        let pipeline = Self::create_render_pipeline(device, surface_format);
        let sampler = Self::create_sampler(device);

        let texture = Self::create_texture(device, format, size);
        let bind_group = Self::create_bind_group(device, &pipeline, &sampler, &texture);

        Self {
            gpu,
            pipeline,
            sampler,
            format,
            texture,
            bind_group,
            size,
        }
    }

    /// Replace the texture with one of `size`; the pipeline and sampler are kept
    pub fn resize(&mut self, size: ClientRect) {
        if size.is_empty() || size == self.size {
            return;
        }

        let device = self.gpu.device();
        self.texture = Self::create_texture(device, self.format, size);
        self.bind_group = Self::create_bind_group(device, &self.pipeline, &self.sampler, &self.texture);
        self.size = size;
    }

    /// Texture format holding `layout` pixels for a surface of `surface_format`
    pub fn texture_format(layout: PixelLayout, surface_format: TextureFormat) -> TextureFormat {
        let format = match layout {
            PixelLayout::Rgba8 => TextureFormat::Rgba8Unorm,
            PixelLayout::Bgra8 => TextureFormat::Bgra8Unorm,
        };
        if surface_format.is_srgb() {
            format.add_srgb_suffix()
        } else {
            format
        }
    }

    pub fn size(&self) -> ClientRect {
        self.size
    }

    /// Copy a full frame into the texture
    pub fn upload(&self, pixels: &[u8], bytes_per_row: u32) -> Result<()> {
        let expected = bytes_per_row as usize * self.size.height as usize;
        if bytes_per_row < self.size.width * 4 || pixels.len() < expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        self.gpu.queue().write_texture(
            self.texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(self.size.height),
            },
            wgpu::Extent3d {
                width: self.size.width,
                height: self.size.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Record the full-screen draw into `view`
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }

    fn create_texture(device: &Device, format: TextureFormat, size: ClientRect) -> Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Blit Texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_sampler(device: &Device) -> Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }

    /// Bind `texture` against the layout the pipeline was built with
    fn create_bind_group(device: &Device, pipeline: &RenderPipeline, sampler: &Sampler, texture: &Texture) -> BindGroup {
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group_layout = pipeline.get_bind_group_layout(0);

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_render_pipeline(device: &Device, surface_format: TextureFormat) -> RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
