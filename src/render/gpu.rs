//! GPU backend: tessellated clock face drawn with wgpu, label through egui.

use std::sync::Arc;

use wgpu::{BindGroup, Buffer, RenderPipeline, Texture, TextureFormat, TextureView};

use crate::core::clock::YAxis;
use crate::core::display_context::DisplayContext;
use crate::core::gpu_context::GpuContext;
use crate::core::window::{ClientRect, WindowContext};
use crate::error::{RenderError, Result};
use crate::render::tessellate::{tessellate, Mesh, TextRun, Vertex, ViewUniform};
use crate::render::{Backend, FrameParams, Renderer};
use crate::scene::ClockFace;

const INITIAL_VERTEX_CAPACITY: usize = 4096;

/// Clock renderer drawing triangles straight into the window frame
#[derive(Default)]
pub struct GpuRenderer {
    resources: Option<GpuResources>,
    target: Option<MultisampleTarget>,
}

/// Everything that survives a resize
struct GpuResources {
    gpu: Arc<GpuContext>,
    format: TextureFormat,
    sample_count: u32,
    pipeline: RenderPipeline,
    view_buffer: Buffer,
    view_bind_group: BindGroup,
    vertex_buffer: Buffer,
    vertex_capacity: usize,
    overlay: LabelOverlay,
}

/// Multisampled colour target resolved into the presented frame
struct MultisampleTarget {
    // Kept alongside its view; `None` when the adapter cannot multisample
    _texture: Option<Texture>,
    view: Option<TextureView>,
    size: ClientRect,
}

impl GpuRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample count picked for the surface format, once initialized
    pub fn sample_count(&self) -> Option<u32> {
        self.resources.as_ref().map(|r| r.sample_count)
    }
}

impl Renderer<DisplayContext> for GpuRenderer {
    fn backend(&self) -> Backend {
        Backend::Gpu
    }

    fn init(&mut self, display: &DisplayContext) -> Result<()> {
        let rect = display.client_rect();
        if rect.is_empty() {
            return Err(RenderError::EmptySurface {
                width: rect.width,
                height: rect.height,
            });
        }

        let resources = GpuResources::new(display);
        log::info!("GPU renderer using {}x multisampling", resources.sample_count);
        self.resources = Some(resources);
        self.resize(display, rect)
    }

    fn render_frame(&mut self, display: &DisplayContext, frame: &FrameParams<'_>) {
        let overlay = frame.overlay(self.supports_text());
        let (Some(resources), Some(target)) = (self.resources.as_mut(), self.target.as_ref()) else {
            log::debug!("GPU renderer skipped a frame before init");
            return;
        };

        let face = ClockFace::new(frame.clock.now(), YAxis::Down);
        let mesh = tessellate(&face.display_list(overlay), target.size, resources.format.is_srgb());
        resources.upload(&mesh, target.size);

        let surface_frame = match display.acquire_frame() {
            Ok(surface_frame) => surface_frame,
            Err(e) => {
                log::warn!("GPU frame skipped: {}", e);
                return;
            }
        };
        let frame_view = surface_frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = resources
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clock Encoder"),
            });

        resources.draw_mesh(&mut encoder, target, &frame_view, mesh.vertices.len());
        resources.overlay.draw(display, &mut encoder, &frame_view, &mesh.labels);

        resources.gpu.queue().submit(Some(encoder.finish()));
        surface_frame.present();
    }

    fn resize(&mut self, _display: &DisplayContext, rect: ClientRect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        let resources = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;

        self.target = None;
        self.target = Some(resources.create_target(rect));

        log::debug!("GPU target resized to {}x{}", rect.width, rect.height);
        Ok(())
    }

    fn surface_size(&self) -> Option<ClientRect> {
        self.target.as_ref().map(|t| t.size)
    }
}

impl GpuResources {
    fn new(display: &DisplayContext) -> Self {
        let gpu = display.gpu().clone();
        let device = gpu.device();
        let format = display.format();
        let sample_count = gpu.sample_count(format);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Clock Shapes Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/shapes.wgsl").into()),
        });

        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Clock View Uniform"),
            size: std::mem::size_of::<ViewUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Clock View Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Clock View Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Clock Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Clock Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = Self::create_vertex_buffer(device, INITIAL_VERTEX_CAPACITY);
        let overlay = LabelOverlay::new(display);

        Self {
            gpu,
            format,
            sample_count,
            pipeline,
            view_buffer,
            view_bind_group,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            overlay,
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Clock Vertex Buffer"),
            size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_target(&self, size: ClientRect) -> MultisampleTarget {
        if self.sample_count <= 1 {
            return MultisampleTarget {
                _texture: None,
                view: None,
                size,
            };
        }

        let texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Clock Multisample Target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        MultisampleTarget {
            _texture: Some(texture),
            view: Some(view),
            size,
        }
    }

    fn upload(&mut self, mesh: &Mesh, size: ClientRect) {
        if mesh.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = mesh.vertices.len().next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(self.gpu.device(), self.vertex_capacity);
        }

        let queue = self.gpu.queue();
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&ViewUniform::new(size)));
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
    }

    fn draw_mesh(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &MultisampleTarget,
        frame_view: &TextureView,
        vertex_count: usize,
    ) {
        let (view, resolve_target, store) = match &target.view {
            Some(msaa) => (msaa, Some(frame_view), wgpu::StoreOp::Discard),
            None => (frame_view, None, wgpu::StoreOp::Store),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clock Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if vertex_count == 0 {
            return;
        }

        let bytes = (vertex_count * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress;
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.view_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..bytes));
        render_pass.draw(0..vertex_count as u32, 0..1);
    }
}

/// egui pass drawing text runs over the resolved frame
struct LabelOverlay {
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl LabelOverlay {
    fn new(display: &DisplayContext) -> Self {
        let window = display.window();
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            display.gpu().device(),
            display.format(),
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    fn draw(
        &mut self,
        display: &DisplayContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &TextureView,
        labels: &[TextRun],
    ) {
        if labels.is_empty() {
            return;
        }

        let window = display.window();
        let pixels_per_point = window.scale_factor() as f32;
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            for (i, run) in labels.iter().enumerate() {
                let [r, g, b, a] = run.color.to_rgba8();
                // Origin is the baseline; egui places the top of the text
                let top_left = egui::pos2(run.origin.x, run.origin.y - run.size) / pixels_per_point;

                egui::Window::new(format!("label-{i}"))
                    .title_bar(false)
                    .resizable(false)
                    .fixed_pos(top_left)
                    .frame(egui::Frame::NONE)
                    .show(ctx, |ui| {
                        ui.label(
                            egui::RichText::new(&run.text)
                                .size(run.size / pixels_per_point)
                                .color(egui::Color32::from_rgba_unmultiplied(r, g, b, a)),
                        );
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(display.gpu().device(), display.gpu().queue(), *id, image_delta);
        }

        let size = display.surface_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point,
        };

        self.egui_renderer.update_buffers(
            display.gpu().device(),
            display.gpu().queue(),
            encoder,
            &tris,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Label Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.egui_renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
