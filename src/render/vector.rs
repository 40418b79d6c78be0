//! Vector backend: anti-aliased paths rendered by tiny-skia.

use tiny_skia::{Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::core::clock::YAxis;
use crate::core::window::ClientRect;
use crate::error::{RenderError, Result};
use crate::render::blend::{draw_label, CoverageMask};
use crate::render::{Backend, FramePresenter, FrameParams, PixelLayout, Renderer};
use crate::scene::{ClockFace, DrawOp, Rgba};

/// Pixmap the vector backend draws into
pub struct VectorSurface {
    pixmap: Pixmap,
    mask: CoverageMask,
}

impl VectorSurface {
    pub fn new(rect: ClientRect) -> Result<Self> {
        if rect.is_empty() {
            return Err(RenderError::EmptySurface {
                width: rect.width,
                height: rect.height,
            });
        }
        let pixmap = Pixmap::new(rect.width, rect.height).ok_or(RenderError::SurfaceAllocation {
            width: rect.width,
            height: rect.height,
        })?;

        Ok(Self {
            pixmap,
            mask: CoverageMask::new(rect.width, rect.height),
        })
    }

    pub fn size(&self) -> ClientRect {
        ClientRect::new(self.pixmap.width(), self.pixmap.height())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Premultiplied RGBA bytes, rows packed
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn stride(&self) -> u32 {
        self.pixmap.width() * 4
    }

    /// Unit square centred in the viewport
    pub fn face_transform(&self) -> Transform {
        Transform::from_scale(self.pixmap.width() as f32, self.pixmap.height() as f32)
            .pre_translate(0.5, 0.5)
    }

    /// Replay a display list over a white surface
    pub fn paint(&mut self, ops: &[DrawOp]) {
        self.pixmap.fill(Color::WHITE);
        let face = self.face_transform();

        for op in ops {
            match op {
                DrawOp::Background(color) => {
                    let (w, h) = (self.pixmap.width() as f32, self.pixmap.height() as f32);
                    if let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) {
                        self.pixmap.fill_rect(rect, &paint(*color), Transform::identity(), None);
                    }
                }
                DrawOp::FillCircle { center, radius, color } => {
                    if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                        self.pixmap.fill_path(&path, &paint(*color), FillRule::Winding, face, None);
                    }
                }
                DrawOp::StrokeCircle { center, radius, width, color } => {
                    if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                        let stroke = Stroke {
                            width: *width,
                            ..Stroke::default()
                        };
                        self.pixmap.stroke_path(&path, &paint(*color), &stroke, face, None);
                    }
                }
                DrawOp::Line { from, to, width, color } => {
                    let mut builder = PathBuilder::new();
                    builder.move_to(from.x, from.y);
                    builder.line_to(to.x, to.y);
                    if let Some(path) = builder.finish() {
                        let stroke = Stroke {
                            width: *width,
                            line_cap: LineCap::Round,
                            ..Stroke::default()
                        };
                        self.pixmap.stroke_path(&path, &paint(*color), &stroke, face, None);
                    }
                }
                DrawOp::Label { text, origin, size, color } => {
                    draw_label(&mut self.mask, text, *origin, *size);
                    let stride = self.stride() as usize;
                    self.mask
                        .composite(self.pixmap.data_mut(), stride, PixelLayout::Rgba8, color.to_rgba8());
                }
                DrawOp::Marker { center, radius, color } => {
                    if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                        self.pixmap
                            .fill_path(&path, &paint(*color), FillRule::Winding, Transform::identity(), None);
                    }
                }
            }
        }
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Clock renderer backed by tiny-skia
pub struct VectorRenderer<D: FramePresenter> {
    surface: Option<VectorSurface>,
    target: Option<D::Target>,
}

impl<D: FramePresenter> VectorRenderer<D> {
    pub fn new() -> Self {
        Self {
            surface: None,
            target: None,
        }
    }

    pub fn surface(&self) -> Option<&VectorSurface> {
        self.surface.as_ref()
    }
}

impl<D: FramePresenter> Default for VectorRenderer<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: FramePresenter> Renderer<D> for VectorRenderer<D> {
    fn backend(&self) -> Backend {
        Backend::Vector
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
        let (Some(surface), Some(target)) = (self.surface.as_mut(), self.target.as_mut()) else {
            log::debug!("vector renderer skipped a frame before init");
            return;
        };

        let face = ClockFace::new(frame.clock.now(), YAxis::Down);
        surface.paint(&face.display_list(overlay));

        if let Err(e) = display.present(target, surface.data(), surface.stride()) {
            log::warn!("vector frame not presented: {}", e);
        }
    }

    fn resize(&mut self, display: &D, rect: ClientRect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }

        // Release the old surface before allocating its replacement
        self.surface = None;
        let surface = VectorSurface::new(rect)?;

        match self.target.as_mut() {
            Some(target) => display.resize_target(target, rect)?,
            None => self.target = Some(display.create_target(PixelLayout::Rgba8, rect)?),
        }
        self.surface = Some(surface);

        log::debug!("vector surface resized to {}x{}", rect.width, rect.height);
        Ok(())
    }

    fn surface_size(&self) -> Option<ClientRect> {
        self.target.as_ref().and(self.surface.as_ref()).map(VectorSurface::size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ClockState;
    use crate::scene::LabelMode;

    fn pixel(surface: &VectorSurface, x: u32, y: u32) -> [u8; 4] {
        let color = surface.pixmap().pixel(x, y).unwrap();
        [color.red(), color.green(), color.blue(), color.alpha()]
    }

    fn painted(rect: ClientRect, time: ClockState, label: LabelMode) -> VectorSurface {
        let mut surface = VectorSurface::new(rect).unwrap();
        let face = ClockFace::new(time, YAxis::Down);
        surface.paint(&face.display_list(label.resolve(0.0, true)));
        surface
    }

    #[test]
    fn test_rejects_empty_surface() {
        assert!(matches!(
            VectorSurface::new(ClientRect::new(0, 10)),
            Err(RenderError::EmptySurface { .. })
        ));
    }

    #[test]
    fn test_face_transform_centres_unit_square() {
        let surface = VectorSurface::new(ClientRect::new(400, 200)).unwrap();
        let mut points = [tiny_skia::Point::from_xy(0.0, 0.0), tiny_skia::Point::from_xy(0.5, -0.5)];
        surface.face_transform().map_points(&mut points);

        assert_eq!((points[0].x, points[0].y), (200.0, 100.0));
        assert_eq!((points[1].x, points[1].y), (400.0, 0.0));
    }

    #[test]
    fn test_corners_show_background() {
        let surface = painted(ClientRect::new(100, 100), ClockState::new(0, 0, 0, 0), LabelMode::Hidden);
        let [r, g, b, a] = pixel(&surface, 99, 99);

        // Translucent green over white stays opaque and green-dominant
        assert_eq!(a, 255);
        assert!(g > r && g > b);
    }

    #[test]
    fn test_centre_dot_is_black() {
        let surface = painted(ClientRect::new(200, 200), ClockState::new(0, 0, 0, 0), LabelMode::Hidden);
        assert_eq!(pixel(&surface, 100, 100), [0, 0, 0, 255]);
    }

    #[test]
    fn test_hour_hand_points_at_three() {
        let surface = painted(ClientRect::new(200, 200), ClockState::new(3, 0, 0, 0), LabelMode::Hidden);

        // Hour hand spans 0.21 of the viewport to the right of the centre
        let [r, g, b, _] = pixel(&surface, 130, 100);
        assert!(g > r && g > b, "expected green hand, got {:?}", (r, g, b));
        // Nothing green on the opposite side inside the face
        let [r, g, b, _] = pixel(&surface, 70, 100);
        assert!(r > 200 && g > 200 && b > 200);
    }

    #[test]
    fn test_marker_lands_in_corner() {
        let surface = painted(ClientRect::new(100, 100), ClockState::new(0, 0, 0, 0), LabelMode::Marker);
        assert_eq!(pixel(&surface, 10, 10), [0, 0, 0, 255]);
    }

    #[test]
    fn test_label_darkens_top_left() {
        let plain = painted(ClientRect::new(100, 100), ClockState::new(0, 0, 0, 0), LabelMode::Hidden);
        let labelled = painted(ClientRect::new(100, 100), ClockState::new(0, 0, 0, 0), LabelMode::Text);

        let differs = (0..40).any(|x| (0..12).any(|y| pixel(&plain, x, y) != pixel(&labelled, x, y)));
        assert!(differs);
    }
}
