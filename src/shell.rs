//! Application shell: owns one renderer per backend and routes window events
//! to the active one.

use std::path::Path;
use std::time::Instant;

use crate::core::clock::WallClock;
use crate::core::display_context::DisplayContext;
use crate::core::fps::FpsCounter;
use crate::core::window::{ClientRect, WindowContext};
use crate::error::Result;
use crate::render::{Backend, FrameParams, GpuRenderer, Renderer, VectorRenderer};
use crate::scene::LabelMode;

/// Prefix of every window title
pub const TITLE_PREFIX: &str = "Clock Demo";

pub struct Shell<D: WindowContext + ?Sized + 'static = DisplayContext> {
    renderers: Vec<Box<dyn Renderer<D>>>,
    active: Backend,
    fps: FpsCounter,
    label: LabelMode,
    clock: Box<dyn WallClock>,
}

impl Shell<DisplayContext> {
    /// Shell with every backend compiled into this build
    pub fn with_all_backends(active: Backend, label: LabelMode, clock: Box<dyn WallClock>, start: Instant) -> Self {
        let mut renderers: Vec<Box<dyn Renderer<DisplayContext>>> = vec![Box::new(VectorRenderer::<DisplayContext>::new())];
        #[cfg(feature = "imaging")]
        renderers.push(Box::new(crate::render::ImagingRenderer::<DisplayContext>::new()));
        renderers.push(Box::new(GpuRenderer::new()));

        Self::new(renderers, active, label, clock, start)
    }
}

impl<D: WindowContext + ?Sized + 'static> Shell<D> {
    pub fn new(
        renderers: Vec<Box<dyn Renderer<D>>>,
        active: Backend,
        label: LabelMode,
        clock: Box<dyn WallClock>,
        start: Instant,
    ) -> Self {
        let mut shell = Self {
            renderers,
            active,
            fps: FpsCounter::new(start),
            label,
            clock,
        };
        shell.active = shell.resolve(active);
        shell
    }

    /// Initialize every renderer; failures leave that backend unusable
    pub fn init(&mut self, display: &D) {
        for renderer in &mut self.renderers {
            match renderer.init(display) {
                Ok(()) => log::info!("{} backend ready", renderer.backend()),
                Err(e) => log::error!("{} backend failed to initialize: {}", renderer.backend(), e),
            }
        }
    }

    /// Resize every renderer's surface, then repaint
    pub fn resize(&mut self, display: &D, rect: ClientRect) {
        if rect.is_empty() {
            log::debug!("ignoring resize to {}x{}", rect.width, rect.height);
            return;
        }

        for renderer in &mut self.renderers {
            if let Err(e) = renderer.resize(display, rect) {
                log::warn!("{} backend failed to resize: {}", renderer.backend(), e);
            }
        }
        self.paint(display);
    }

    /// Redraw outside the idle loop; the label shows 0 fps
    pub fn paint(&mut self, display: &D) {
        self.render(display, 0.0);
    }

    /// Idle-loop frame: measure, render, count
    pub fn tick(&mut self, display: &D, now: Instant) -> f32 {
        let fps = self.fps.sample(now);
        self.render(display, fps);
        self.fps.frame_rendered();
        fps
    }

    fn render(&mut self, display: &D, fps: f32) {
        let frame = FrameParams::new(fps, self.clock.as_ref(), self.label);
        let active = self.active;
        if let Some(renderer) = self.renderers.iter_mut().find(|r| r.backend() == active) {
            renderer.render_frame(display, &frame);
        }
    }

    /// Make `backend` active, falling back to the vector backend when it is
    /// not available. Returns the backend that became active.
    pub fn switch_to(&mut self, backend: Backend) -> Backend {
        let resolved = self.resolve(backend);
        if resolved != self.active {
            log::info!("switching to {} backend", resolved);
        }
        self.active = resolved;
        resolved
    }

    /// Activate the next backend in creation order
    pub fn cycle(&mut self) -> Backend {
        let backends = self.backends();
        let next = backends
            .iter()
            .position(|&b| b == self.active)
            .map(|i| backends[(i + 1) % backends.len()])
            .unwrap_or(self.active);
        self.switch_to(next)
    }

    fn resolve(&self, backend: Backend) -> Backend {
        if self.has(backend) {
            return backend;
        }

        let fallback = if self.has(Backend::Vector) {
            Backend::Vector
        } else {
            self.renderers.first().map(|r| r.backend()).unwrap_or(Backend::Vector)
        };
        log::warn!("{} backend is not available, using {}", backend, fallback);
        fallback
    }

    fn has(&self, backend: Backend) -> bool {
        backend.is_available() && self.renderers.iter().any(|r| r.backend() == backend)
    }

    pub fn active(&self) -> Backend {
        self.active
    }

    pub fn backends(&self) -> Vec<Backend> {
        self.renderers.iter().map(|r| r.backend()).collect()
    }

    pub fn renderer(&self, backend: Backend) -> Option<&dyn Renderer<D>> {
        self.renderers
            .iter()
            .find(|r| r.backend() == backend)
            .map(|r| r.as_ref())
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label
    }

    pub fn set_label_mode(&mut self, label: LabelMode) {
        self.label = label;
    }

    pub fn fps_counter(&self) -> &FpsCounter {
        &self.fps
    }

    /// Window title naming the active backend
    pub fn title(&self) -> String {
        format!("{}: {}", TITLE_PREFIX, self.active.label())
    }

    /// Write the active backend's last frame as BMP.
    /// Returns false when the backend keeps no CPU copy.
    pub fn snapshot(&self, path: &Path) -> Result<bool> {
        let Some(buffer) = self.renderer(self.active).and_then(|r| r.snapshot()) else {
            log::info!("{} backend has no pixel buffer to save", self.active);
            return Ok(false);
        };

        buffer.save_bmp(path)?;
        log::info!("saved {}x{} snapshot to {}", buffer.width(), buffer.height(), path.display());
        Ok(true)
    }
}
