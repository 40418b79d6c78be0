use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use clock_demo::core::{ClientRect, ClockState, FixedClock, WindowContext};
use clock_demo::error::{RenderError, Result};
use clock_demo::scene::LabelMode;
use clock_demo::{Backend, FrameParams, Renderer, Shell};

struct MockDisplay {
    rect: Cell<ClientRect>,
    redraws: Cell<usize>,
}

impl MockDisplay {
    fn new(width: u32, height: u32) -> Self {
        Self {
            rect: Cell::new(ClientRect::new(width, height)),
            redraws: Cell::new(0),
        }
    }
}

impl WindowContext for MockDisplay {
    fn client_rect(&self) -> ClientRect {
        self.rect.get()
    }

    fn request_redraw(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Init(Backend),
    Resize(Backend, ClientRect),
    Frame {
        backend: Backend,
        fps: f32,
        time: ClockState,
        label: LabelMode,
    },
}

type EventLog = Rc<RefCell<Vec<Event>>>;

struct MockRenderer {
    backend: Backend,
    events: EventLog,
    size: Option<ClientRect>,
    fail_init: bool,
}

impl MockRenderer {
    fn boxed(backend: Backend, events: &EventLog) -> Box<dyn Renderer<MockDisplay>> {
        Box::new(Self {
            backend,
            events: events.clone(),
            size: None,
            fail_init: false,
        })
    }

    fn failing(backend: Backend, events: &EventLog) -> Box<dyn Renderer<MockDisplay>> {
        Box::new(Self {
            backend,
            events: events.clone(),
            size: None,
            fail_init: true,
        })
    }
}

impl Renderer<MockDisplay> for MockRenderer {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn init(&mut self, display: &MockDisplay) -> Result<()> {
        self.events.borrow_mut().push(Event::Init(self.backend));
        if self.fail_init {
            return Err(RenderError::NotInitialized);
        }
        self.size = Some(display.client_rect());
        Ok(())
    }

    fn render_frame(&mut self, _display: &MockDisplay, frame: &FrameParams<'_>) {
        if self.size.is_none() {
            return;
        }
        self.events.borrow_mut().push(Event::Frame {
            backend: self.backend,
            fps: frame.fps,
            time: frame.clock.now(),
            label: frame.label,
        });
    }

    fn resize(&mut self, _display: &MockDisplay, rect: ClientRect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        self.events.borrow_mut().push(Event::Resize(self.backend, rect));
        if self.size.is_some() {
            self.size = Some(rect);
        }
        Ok(())
    }

    fn surface_size(&self) -> Option<ClientRect> {
        self.size
    }
}

const NOON: ClockState = ClockState {
    hour: 12,
    minute: 0,
    second: 0,
    millisecond: 0,
};

fn shell_with(renderers: Vec<Box<dyn Renderer<MockDisplay>>>, active: Backend) -> (Shell<MockDisplay>, Instant) {
    let start = Instant::now();
    let shell = Shell::new(renderers, active, LabelMode::Text, Box::new(FixedClock(NOON)), start);
    (shell, start)
}

fn all_three(events: &EventLog) -> Vec<Box<dyn Renderer<MockDisplay>>> {
    vec![
        MockRenderer::boxed(Backend::Vector, events),
        MockRenderer::boxed(Backend::Imaging, events),
        MockRenderer::boxed(Backend::Gpu, events),
    ]
}

fn frames(events: &EventLog) -> Vec<Event> {
    events
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Frame { .. }))
        .cloned()
        .collect()
}

#[test]
fn test_init_reaches_every_renderer() {
    let events = EventLog::default();
    let (mut shell, _) = shell_with(all_three(&events), Backend::Vector);
    let display = MockDisplay::new(400, 400);

    shell.init(&display);

    assert_eq!(
        *events.borrow(),
        vec![
            Event::Init(Backend::Vector),
            Event::Init(Backend::Imaging),
            Event::Init(Backend::Gpu),
        ]
    );
    for backend in shell.backends() {
        assert_eq!(shell.renderer(backend).unwrap().surface_size(), Some(ClientRect::new(400, 400)));
    }
}

#[test]
fn test_failed_init_leaves_renderer_unusable() {
    let events = EventLog::default();
    let renderers = vec![
        MockRenderer::boxed(Backend::Vector, &events),
        MockRenderer::failing(Backend::Gpu, &events),
    ];
    let (mut shell, _) = shell_with(renderers, Backend::Gpu);
    let display = MockDisplay::new(400, 400);

    shell.init(&display);
    assert!(!shell.renderer(Backend::Gpu).unwrap().is_ready());
    assert!(shell.renderer(Backend::Vector).unwrap().is_ready());

    // Painting the broken backend draws nothing and does not panic
    shell.paint(&display);
    assert!(frames(&events).is_empty());
}

#[test]
fn test_resize_reaches_all_then_paints_active() {
    let events = EventLog::default();
    let (mut shell, _) = shell_with(all_three(&events), Backend::Imaging);
    let display = MockDisplay::new(400, 400);
    shell.init(&display);
    events.borrow_mut().clear();

    let rect = ClientRect::new(640, 480);
    shell.resize(&display, rect);

    let log = events.borrow().clone();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0], Event::Resize(Backend::Vector, rect));
    assert_eq!(log[1], Event::Resize(Backend::Imaging, rect));
    assert_eq!(log[2], Event::Resize(Backend::Gpu, rect));
    match &log[3] {
        Event::Frame { backend, fps, .. } => {
            assert_eq!(*backend, Backend::Imaging);
            assert_eq!(*fps, 0.0);
        }
        other => panic!("expected a frame, got {other:?}"),
    }

    for backend in shell.backends() {
        assert_eq!(shell.renderer(backend).unwrap().surface_size(), Some(rect));
    }
}

#[test]
fn test_empty_resize_is_ignored() {
    let events = EventLog::default();
    let (mut shell, _) = shell_with(all_three(&events), Backend::Vector);
    let display = MockDisplay::new(400, 400);
    shell.init(&display);
    events.borrow_mut().clear();

    shell.resize(&display, ClientRect::new(0, 0));

    assert!(events.borrow().is_empty());
    assert_eq!(
        shell.renderer(Backend::Vector).unwrap().surface_size(),
        Some(ClientRect::new(400, 400))
    );
}

#[test]
fn test_tick_renders_active_with_measured_fps() {
    let events = EventLog::default();
    let (mut shell, start) = shell_with(all_three(&events), Backend::Vector);
    let display = MockDisplay::new(400, 400);
    shell.init(&display);

    // 30 frames at the start instant, then one sample half a second later
    for _ in 0..30 {
        shell.tick(&display, start);
    }
    let fps = shell.tick(&display, start + Duration::from_millis(500));
    assert!((fps - 60.0).abs() < 0.01);
    assert_eq!(shell.fps_counter().frames(), 31);

    let rendered = frames(&events);
    assert_eq!(rendered.len(), 31);
    assert!(rendered.iter().all(|e| matches!(
        e,
        Event::Frame {
            backend: Backend::Vector,
            time: NOON,
            label: LabelMode::Text,
            ..
        }
    )));
}

#[test]
fn test_fps_window_restarts_after_a_second() {
    let events = EventLog::default();
    let (mut shell, start) = shell_with(all_three(&events), Backend::Vector);
    let display = MockDisplay::new(400, 400);
    shell.init(&display);

    for _ in 0..10 {
        shell.tick(&display, start);
    }
    shell.tick(&display, start + Duration::from_secs(2));

    // The sample restarted the window; only the frame just drawn is counted
    assert_eq!(shell.fps_counter().frames(), 1);
}

#[test]
fn test_paint_uses_zero_fps() {
    let events = EventLog::default();
    let (mut shell, start) = shell_with(all_three(&events), Backend::Gpu);
    let display = MockDisplay::new(400, 400);
    shell.init(&display);

    for _ in 0..5 {
        shell.tick(&display, start + Duration::from_millis(100));
    }
    shell.paint(&display);

    match frames(&events).last() {
        Some(Event::Frame { backend, fps, .. }) => {
            assert_eq!(*backend, Backend::Gpu);
            assert_eq!(*fps, 0.0);
        }
        other => panic!("expected a frame, got {other:?}"),
    }
}

#[test]
fn test_switch_and_title() {
    let events = EventLog::default();
    let (mut shell, _) = shell_with(all_three(&events), Backend::Vector);
    assert_eq!(shell.title(), "Clock Demo: tiny-skia");

    assert_eq!(shell.switch_to(Backend::Gpu), Backend::Gpu);
    assert_eq!(shell.active(), Backend::Gpu);
    assert_eq!(shell.title(), "Clock Demo: wgpu");
}

#[test]
fn test_missing_backend_falls_back_to_vector() {
    let events = EventLog::default();
    let renderers = vec![
        MockRenderer::boxed(Backend::Vector, &events),
        MockRenderer::boxed(Backend::Gpu, &events),
    ];
    let (mut shell, _) = shell_with(renderers, Backend::Imaging);
    assert_eq!(shell.active(), Backend::Vector);

    shell.switch_to(Backend::Gpu);
    assert_eq!(shell.switch_to(Backend::Imaging), Backend::Vector);
}

#[test]
fn test_cycle_wraps_in_creation_order() {
    let events = EventLog::default();
    let (mut shell, _) = shell_with(all_three(&events), Backend::Vector);

    assert_eq!(shell.cycle(), Backend::Imaging);
    assert_eq!(shell.cycle(), Backend::Gpu);
    assert_eq!(shell.cycle(), Backend::Vector);
}

#[test]
fn test_label_mode_reaches_renderer() {
    let events = EventLog::default();
    let (mut shell, _) = shell_with(all_three(&events), Backend::Vector);
    let display = MockDisplay::new(400, 400);
    shell.init(&display);

    shell.set_label_mode(LabelMode::Marker);
    shell.paint(&display);

    assert!(matches!(
        frames(&events).last(),
        Some(Event::Frame {
            label: LabelMode::Marker,
            ..
        })
    ));
}

#[test]
fn test_snapshot_without_pixel_buffer() {
    let events = EventLog::default();
    let (shell, _) = shell_with(all_three(&events), Backend::Vector);
    let path = std::env::temp_dir().join("clock-demo-unused.bmp");

    assert!(!shell.snapshot(&path).unwrap());
    assert!(!path.exists());
}

#[test]
fn test_mock_display_counts_redraws() {
    let display = MockDisplay::new(10, 10);
    display.request_redraw();
    assert_eq!(display.redraws.get(), 1);
}
