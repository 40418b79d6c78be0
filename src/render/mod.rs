//! Backend-specific clock renderers behind one polymorphic interface.

use std::fmt;

use serde::Deserialize;

use crate::core::clock::WallClock;
use crate::core::display_context::DisplayContext;
use crate::core::window::{ClientRect, WindowContext};
use crate::error::Result;
use crate::pixels::PixelBuffer;
use crate::scene::{DrawOp, LabelMode};

pub mod blend;
pub mod gpu;
#[cfg(feature = "imaging")]
pub mod imaging;
pub mod tessellate;
pub mod vector;

pub use gpu::GpuRenderer;
#[cfg(feature = "imaging")]
pub use imaging::{ImagingContext, ImagingRenderer};
pub use vector::{VectorRenderer, VectorSurface};

/// Drawing backends the demo can switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Anti-aliased vector paths (tiny-skia)
    Vector,
    /// Primitives on a 32-bit pixel buffer (embedded-graphics)
    Imaging,
    /// Tessellated triangles on the GPU (wgpu)
    Gpu,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Vector, Backend::Imaging, Backend::Gpu];

    /// Name shown in the window title
    pub fn label(self) -> &'static str {
        match self {
            Backend::Vector => "tiny-skia",
            Backend::Imaging => "embedded-graphics",
            Backend::Gpu => "wgpu",
        }
    }

    /// Whether the backend was compiled into this build
    pub fn is_available(self) -> bool {
        match self {
            Backend::Imaging => cfg!(feature = "imaging"),
            Backend::Vector | Backend::Gpu => true,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-frame inputs handed to the active renderer
#[derive(Clone, Copy)]
pub struct FrameParams<'a> {
    /// Measured frame rate; paint events pass 0
    pub fps: f32,
    /// Sampled by the renderer while drawing the hands
    pub clock: &'a dyn WallClock,
    pub label: LabelMode,
}

impl<'a> FrameParams<'a> {
    pub fn new(fps: f32, clock: &'a dyn WallClock, label: LabelMode) -> Self {
        Self { fps, clock, label }
    }

    /// Label command for a backend with or without text support
    pub fn overlay(&self, supports_text: bool) -> Option<DrawOp> {
        self.label.resolve(self.fps, supports_text)
    }
}

/// One way of drawing the clock into the host window
///
/// A renderer owns its render surface and the resources that do not depend
/// on the window size. Dropping it releases everything.
pub trait Renderer<D: WindowContext + ?Sized = DisplayContext> {
    fn backend(&self) -> Backend;

    /// Acquire resources and allocate a surface sized to the client area
    fn init(&mut self, display: &D) -> Result<()>;

    /// Draw one frame and present it. Failures are logged, never returned.
    fn render_frame(&mut self, display: &D, frame: &FrameParams<'_>);

    /// Replace the render surface with one of exactly `rect`.
    /// Empty rectangles (minimized window) are ignored.
    fn resize(&mut self, display: &D, rect: ClientRect) -> Result<()>;

    /// Size of the current render surface
    fn surface_size(&self) -> Option<ClientRect>;

    fn is_ready(&self) -> bool {
        self.surface_size().is_some()
    }

    fn supports_text(&self) -> bool {
        true
    }

    /// CPU copy of the last frame, when the backend keeps one
    fn snapshot(&self) -> Option<&PixelBuffer> {
        None
    }
}

/// Byte order of a CPU-rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba8,
    Bgra8,
}

/// Window able to show frames drawn on the CPU
pub trait FramePresenter: WindowContext {
    /// Per-renderer upload target, sized like its render surface
    type Target;

    fn create_target(&self, layout: PixelLayout, rect: ClientRect) -> Result<Self::Target>;

    /// Resize an existing target in place, keeping what does not depend on size
    fn resize_target(&self, target: &mut Self::Target, rect: ClientRect) -> Result<()>;

    /// Upload premultiplied pixels and show them in the window
    fn present(&self, target: &mut Self::Target, pixels: &[u8], bytes_per_row: u32) -> Result<()>;
}

/// Clamp a unit-space stroke to at least one device pixel
pub(crate) fn device_width(width: f32, scale: f32) -> f32 {
    (width * scale).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{ClockState, FixedClock};

    #[test]
    fn test_backend_labels_are_distinct() {
        let labels: Vec<_> = Backend::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(labels.len(), 3);
        assert_ne!(labels[0], labels[1]);
        assert_ne!(labels[1], labels[2]);
        assert_eq!(Backend::Gpu.to_string(), "wgpu");
    }

    #[test]
    fn test_vector_and_gpu_always_available() {
        assert!(Backend::Vector.is_available());
        assert!(Backend::Gpu.is_available());
        assert_eq!(Backend::Imaging.is_available(), cfg!(feature = "imaging"));
    }

    #[test]
    fn test_backend_from_json() {
        let backend: Backend = serde_json::from_str("\"imaging\"").unwrap();
        assert_eq!(backend, Backend::Imaging);
    }

    #[test]
    fn test_frame_overlay_follows_label_mode() {
        let clock = FixedClock(ClockState::new(1, 2, 3, 4));
        let frame = FrameParams::new(0.0, &clock, LabelMode::Text);

        match frame.overlay(true) {
            Some(DrawOp::Label { text, .. }) => assert_eq!(text, "fps: 0"),
            other => panic!("expected label, got {other:?}"),
        }
        assert!(matches!(frame.overlay(false), Some(DrawOp::Marker { .. })));
    }

    #[test]
    fn test_device_width_never_vanishes() {
        assert!((device_width(0.05, 400.0) - 20.0).abs() < 1e-4);
        assert_eq!(device_width(0.001, 100.0), 1.0);
    }
}
