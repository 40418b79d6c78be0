//! Imaging backend: embedded-graphics primitives on a 32-bit pixel buffer.
//!
//! The context keeps its own current transformation matrix with the origin
//! in the bottom-left corner and Y growing upwards, the convention of
//! bitmap-context imaging APIs.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Ellipse, Line, PrimitiveStyle, PrimitiveStyleBuilder};
use glam::{Affine2, Vec2};

use crate::core::clock::YAxis;
use crate::core::window::ClientRect;
use crate::error::{RenderError, Result};
use crate::pixels::{PixelBuffer, PixelRect};
use crate::render::blend::{draw_label, CoverageMask};
use crate::render::{device_width, Backend, FramePresenter, FrameParams, PixelLayout, Renderer};
use crate::scene::{ClockFace, DrawOp, Rgba};

/// Drawing context bound to a 32-bit BGRA pixel buffer
pub struct ImagingContext {
    buffer: PixelBuffer,
    mask: CoverageMask,
    ctm: Affine2,
}

impl ImagingContext {
    /// Wrap `buffer`; anything but 32 bits per pixel is refused
    pub fn from_buffer(buffer: PixelBuffer) -> Result<Self> {
        if buffer.bits_per_pixel() != 32 {
            return Err(RenderError::PixelFormat(buffer.bits_per_pixel()));
        }

        let mask = CoverageMask::new(buffer.width(), buffer.height());
        let mut context = Self {
            buffer,
            mask,
            ctm: Affine2::IDENTITY,
        };
        context.reset_ctm();
        Ok(context)
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }

    pub fn size(&self) -> ClientRect {
        self.buffer.size()
    }

    pub fn ctm(&self) -> Affine2 {
        self.ctm
    }

    /// Back to the default user space: origin bottom-left, one unit per pixel
    pub fn reset_ctm(&mut self) {
        let height = self.buffer.height() as f32;
        self.ctm = Affine2::from_cols(Vec2::X, Vec2::NEG_Y, Vec2::new(0.0, height));
    }

    pub fn scale_ctm(&mut self, sx: f32, sy: f32) {
        self.ctm = self.ctm * Affine2::from_scale(Vec2::new(sx, sy));
    }

    pub fn translate_ctm(&mut self, tx: f32, ty: f32) {
        self.ctm = self.ctm * Affine2::from_translation(Vec2::new(tx, ty));
    }

    /// User-space point in device pixels
    pub fn to_device(&self, point: Vec2) -> Vec2 {
        self.ctm.transform_point2(point)
    }

    /// Device lengths of one user unit along x and y
    fn axis_scale(&self) -> Vec2 {
        Vec2::new(self.ctm.matrix2.x_axis.length(), self.ctm.matrix2.y_axis.length())
    }

    /// Uniform scale used for stroke widths
    fn stroke_scale(&self) -> f32 {
        self.ctm.matrix2.determinant().abs().sqrt()
    }

    fn device_point(&self, point: Vec2) -> Point {
        let device = self.to_device(point);
        Point::new(device.x.round() as i32, device.y.round() as i32)
    }

    fn composite(&mut self, color: Rgba) {
        let stride = self.buffer.stride();
        self.mask
            .composite(self.buffer.data_mut(), stride, PixelLayout::Bgra8, color.to_rgba8());
    }

    /// Blend `color` over the whole buffer
    pub fn fill_all(&mut self, color: Rgba) {
        let (w, h) = (self.buffer.width(), self.buffer.height());
        embedded_graphics::primitives::Rectangle::new(Point::zero(), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.mask)
            .ok();
        self.composite(color);
    }

    pub fn fill_ellipse(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let size = self.axis_scale() * radius * 2.0;
        Ellipse::with_center(self.device_point(center), to_size(size))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.mask)
            .ok();
        self.composite(color);
    }

    pub fn stroke_ellipse(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        let size = self.axis_scale() * radius * 2.0;
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(BinaryColor::On)
            .stroke_width(device_width(width, self.stroke_scale()).round() as u32)
            .build();
        Ellipse::with_center(self.device_point(center), to_size(size))
            .into_styled(style)
            .draw(&mut self.mask)
            .ok();
        self.composite(color);
    }

    /// Segment with round caps, blended as one shape
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let stroke = device_width(width, self.stroke_scale()).round() as u32;
        let (start, end) = (self.device_point(from), self.device_point(to));
        let cap = PrimitiveStyle::with_fill(BinaryColor::On);

        Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, stroke))
            .draw(&mut self.mask)
            .ok();
        for point in [start, end] {
            Circle::with_center(point, stroke).into_styled(cap).draw(&mut self.mask).ok();
        }
        self.composite(color);
    }

    /// Text in device pixels, baseline at `origin` from the top-left corner
    pub fn show_text(&mut self, text: &str, origin: Vec2, size: f32, color: Rgba) {
        draw_label(&mut self.mask, text, origin, size);
        self.composite(color);
    }

    /// Filled dot in device pixels from the top-left corner
    pub fn fill_marker(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let point = Point::new(center.x.round() as i32, center.y.round() as i32);
        Circle::with_center(point, (radius * 2.0).round() as u32)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.mask)
            .ok();
        self.composite(color);
    }

    /// Draw a display list over white, then force an opaque alpha channel
    pub fn paint(&mut self, ops: &[DrawOp]) {
        let (w, h) = (self.buffer.width(), self.buffer.height());
        self.buffer.fill(&[255, 255, 255, 255]);
        self.reset_ctm();
        self.scale_ctm(w as f32, h as f32);
        self.translate_ctm(0.5, 0.5);

        for op in ops {
            match op {
                DrawOp::Background(color) => self.fill_all(*color),
                DrawOp::FillCircle { center, radius, color } => self.fill_ellipse(*center, *radius, *color),
                DrawOp::StrokeCircle { center, radius, width, color } => {
                    self.stroke_ellipse(*center, *radius, *width, *color)
                }
                DrawOp::Line { from, to, width, color } => self.stroke_line(*from, *to, *width, *color),
                DrawOp::Label { text, origin, size, color } => self.show_text(text, *origin, *size, *color),
                DrawOp::Marker { center, radius, color } => self.fill_marker(*center, *radius, *color),
            }
        }

        self.buffer.set_alpha(PixelRect::from_size(w, h), 255);
    }
}

fn to_size(size: Vec2) -> Size {
    Size::new(size.x.round().max(1.0) as u32, size.y.round().max(1.0) as u32)
}

/// Clock renderer backed by embedded-graphics
pub struct ImagingRenderer<D: FramePresenter> {
    context: Option<ImagingContext>,
    target: Option<D::Target>,
}

impl<D: FramePresenter> ImagingRenderer<D> {
    pub fn new() -> Self {
        Self {
            context: None,
            target: None,
        }
    }

    pub fn context(&self) -> Option<&ImagingContext> {
        self.context.as_ref()
    }
}

impl<D: FramePresenter> Default for ImagingRenderer<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: FramePresenter> Renderer<D> for ImagingRenderer<D> {
    fn backend(&self) -> Backend {
        Backend::Imaging
    }

    fn init(&mut self, display: &D) -> Result<()> {
        let rect = display.client_rect();
        if rect.is_empty() {
            return Err(RenderError::EmptySurface {
                width: rect.width,
                height: rect.height,
            });
        }
        self.resize(display, rect)
    }

    fn render_frame(&mut self, display: &D, frame: &FrameParams<'_>) {
        let overlay = frame.overlay(self.supports_text());
        let (Some(context), Some(target)) = (self.context.as_mut(), self.target.as_mut()) else {
            log::debug!("imaging renderer skipped a frame before init");
            return;
        };

        let face = ClockFace::new(frame.clock.now(), YAxis::Up);
        context.paint(&face.display_list(overlay));

        let buffer = context.buffer();
        if let Err(e) = display.present(target, buffer.data(), buffer.stride() as u32) {
            log::warn!("imaging frame not presented: {}", e);
        }
    }

    fn resize(&mut self, display: &D, rect: ClientRect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }

        self.context = None;
        let context = ImagingContext::from_buffer(PixelBuffer::new(rect.width, rect.height)?)?;

        match self.target.as_mut() {
            Some(target) => display.resize_target(target, rect)?,
            None => self.target = Some(display.create_target(PixelLayout::Bgra8, rect)?),
        }
        self.context = Some(context);

        log::debug!("imaging surface resized to {}x{}", rect.width, rect.height);
        Ok(())
    }

    fn surface_size(&self) -> Option<ClientRect> {
        self.target.as_ref().and(self.context.as_ref()).map(ImagingContext::size)
    }

    fn snapshot(&self) -> Option<&PixelBuffer> {
        self.context.as_ref().map(ImagingContext::buffer)
    }
}
