//! Triangle meshes for the GPU backend.
//!
//! Shapes are tessellated on the CPU in their own space (unit face space or
//! device pixels) and transformed to device pixels, so non-square windows
//! stretch strokes the same way the vector backend does.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2};

use crate::core::window::ClientRect;
use crate::scene::{DrawOp, Rgba};

/// Segments used for a full circle
pub const CIRCLE_SEGMENTS: usize = 64;
/// Segments used for a half-circle line cap
pub const CAP_SEGMENTS: usize = CIRCLE_SEGMENTS / 2;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Device pixels, origin top-left
    pub position: [f32; 2],
    /// Straight alpha
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Device pixels to clip space
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl ViewUniform {
    pub fn new(size: ClientRect) -> Self {
        let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
        Self {
            scale: [2.0 / w, -2.0 / h],
            offset: [-1.0, 1.0],
        }
    }

    pub fn to_clip(&self, position: Vec2) -> Vec2 {
        Vec2::from(self.scale) * position + Vec2::from(self.offset)
    }
}

/// Text left for the overlay pass
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub origin: Vec2,
    pub size: f32,
    pub color: Rgba,
}

/// Triangle list for one frame
#[derive(Debug, Default, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub labels: Vec<TextRun>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Builds a [`Mesh`] from display-list commands
pub struct Tessellator {
    face: Affine2,
    size: ClientRect,
    linear: bool,
    mesh: Mesh,
}

impl Tessellator {
    /// `linear` converts colours for an sRGB render target
    pub fn new(size: ClientRect, linear: bool) -> Self {
        Self {
            face: face_transform(size),
            size,
            linear,
            mesh: Mesh::default(),
        }
    }

    pub fn finish(self) -> Mesh {
        self.mesh
    }

    pub fn push(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Background(color) => {
                let (w, h) = (self.size.width as f32, self.size.height as f32);
                self.quad(
                    Affine2::IDENTITY,
                    [Vec2::ZERO, Vec2::new(w, 0.0), Vec2::new(w, h), Vec2::new(0.0, h)],
                    *color,
                );
            }
            DrawOp::FillCircle { center, radius, color } => self.disk(self.face, *center, *radius, *color),
            DrawOp::StrokeCircle { center, radius, width, color } => {
                self.ring(*center, *radius, *width, *color)
            }
            DrawOp::Line { from, to, width, color } => self.line(*from, *to, *width, *color),
            DrawOp::Label { text, origin, size, color } => self.mesh.labels.push(TextRun {
                text: text.clone(),
                origin: *origin,
                size: *size,
                color: *color,
            }),
            DrawOp::Marker { center, radius, color } => {
                self.disk(Affine2::IDENTITY, *center, *radius, *color)
            }
        }
    }

    fn color(&self, color: Rgba) -> [f32; 4] {
        let color = if self.linear { color.to_linear() } else { color };
        [color.r, color.g, color.b, color.a]
    }

    fn triangle(&mut self, transform: Affine2, points: [Vec2; 3], color: [f32; 4]) {
        self.mesh.vertices.extend(points.map(|p| Vertex {
            position: transform.transform_point2(p).to_array(),
            color,
        }));
    }

    fn quad(&mut self, transform: Affine2, corners: [Vec2; 4], color: Rgba) {
        let color = self.color(color);
        let [a, b, c, d] = corners;
        self.triangle(transform, [a, b, c], color);
        self.triangle(transform, [a, c, d], color);
    }

    fn disk(&mut self, transform: Affine2, center: Vec2, radius: f32, color: Rgba) {
        let color = self.color(color);
        for i in 0..CIRCLE_SEGMENTS {
            let a0 = point_on_circle(center, radius, i);
            let a1 = point_on_circle(center, radius, i + 1);
            self.triangle(transform, [center, a0, a1], color);
        }
    }

    fn ring(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        let (inner, outer) = (radius - width / 2.0, radius + width / 2.0);
        let color = self.color(color);
        for i in 0..CIRCLE_SEGMENTS {
            let (i0, i1) = (point_on_circle(center, inner, i), point_on_circle(center, inner, i + 1));
            let (o0, o1) = (point_on_circle(center, outer, i), point_on_circle(center, outer, i + 1));
            self.triangle(self.face, [i0, o0, o1], color);
            self.triangle(self.face, [i0, o1, i1], color);
        }
    }

    /// Segment with round caps; the body and both caps never overlap
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let half = width / 2.0;
        let direction = (to - from).try_normalize().unwrap_or(Vec2::X);
        let normal = direction.perp() * half;

        self.quad(self.face, [from + normal, to + normal, to - normal, from - normal], color);

        let color = self.color(color);
        self.cap(to, direction, half, color);
        self.cap(from, -direction, half, color);
    }

    /// Half-disk bulging out along `direction`
    fn cap(&mut self, center: Vec2, direction: Vec2, radius: f32, color: [f32; 4]) {
        let base = direction.to_angle() - PI / 2.0;
        let step = PI / CAP_SEGMENTS as f32;
        for i in 0..CAP_SEGMENTS {
            let a0 = center + Vec2::from_angle(base + step * i as f32) * radius;
            let a1 = center + Vec2::from_angle(base + step * (i + 1) as f32) * radius;
            self.triangle(self.face, [center, a0, a1], color);
        }
    }
}

fn point_on_circle(center: Vec2, radius: f32, index: usize) -> Vec2 {
    let angle = TAU * index as f32 / CIRCLE_SEGMENTS as f32;
    center + Vec2::from_angle(angle) * radius
}

/// Unit face space to device pixels: scale by the viewport, then centre
pub fn face_transform(size: ClientRect) -> Affine2 {
    Affine2::from_scale(Vec2::new(size.width as f32, size.height as f32))
        * Affine2::from_translation(Vec2::splat(0.5))
}

/// Tessellate a whole display list
pub fn tessellate(ops: &[DrawOp], size: ClientRect, linear: bool) -> Mesh {
    let mut tessellator = Tessellator::new(size, linear);
    for op in ops {
        tessellator.push(op);
    }
    tessellator.finish()
}
