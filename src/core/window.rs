/// Client-area size of the host window in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientRect {
    pub width: u32,
    pub height: u32,
}

impl ClientRect {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for ClientRect {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Window abstraction - what renderers need to know about the host window
pub trait WindowContext {
    /// Current client area in physical pixels
    fn client_rect(&self) -> ClientRect;

    /// Request the window to redraw
    fn request_redraw(&self);
}

impl WindowContext for winit::window::Window {
    fn client_rect(&self) -> ClientRect {
        self.inner_size().into()
    }

    fn request_redraw(&self) {
        winit::window::Window::request_redraw(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_client_rect_new() {
        let rect = ClientRect::new(400, 300);
        assert_eq!(rect.width, 400);
        assert_eq!(rect.height, 300);
        assert_eq!(rect.pixel_count(), 120_000);
    }

    #[test]
    fn test_client_rect_empty() {
        assert!(ClientRect::new(0, 400).is_empty());
        assert!(ClientRect::new(400, 0).is_empty());
        assert!(!ClientRect::new(1, 1).is_empty());
    }

    #[test]
    fn test_client_rect_from_physical_size() {
        let rect: ClientRect = winit::dpi::PhysicalSize::new(640u32, 480u32).into();
        assert_eq!(rect, ClientRect::new(640, 480));
    }

    struct MockWindow {
        rect: ClientRect,
        redraws: Cell<usize>,
    }

    impl WindowContext for MockWindow {
        fn client_rect(&self) -> ClientRect {
            self.rect
        }

        fn request_redraw(&self) {
            self.redraws.set(self.redraws.get() + 1);
        }
    }

    #[test]
    fn test_window_context_redraw() {
        let window = MockWindow {
            rect: ClientRect::new(400, 400),
            redraws: Cell::new(0),
        };

        window.request_redraw();
        window.request_redraw();
        assert_eq!(window.redraws.get(), 2);
        assert_eq!(window.client_rect(), ClientRect::new(400, 400));
    }
}
