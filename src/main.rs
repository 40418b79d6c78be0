use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use clock_demo::cli::Cli;
use clock_demo::config::Settings;
use clock_demo::core::{ClientRect, DisplayContext, LocalClock, WindowContext};
use clock_demo::{Backend, Shell};

// === Application ===

struct App {
    settings: Settings,
    window: Option<Arc<Window>>,
    display: Option<DisplayContext>,
    shell: Shell,
    last_frame: Instant,
}

impl App {
    fn new(settings: Settings) -> Self {
        let now = Instant::now();
        let shell = Shell::with_all_backends(settings.backend, settings.label, Box::new(LocalClock), now);

        Self {
            settings,
            window: None,
            display: None,
            shell,
            last_frame: now,
        }
    }

    fn select_backend(&mut self, backend: Option<Backend>) {
        match backend {
            Some(backend) => self.shell.switch_to(backend),
            None => self.shell.cycle(),
        };

        if let Some(window) = &self.window {
            window.set_title(&self.shell.title());
        }
        if let Some(display) = &self.display {
            self.shell.paint(display);
        }
    }

    fn save_snapshot(&self) {
        let path = &self.settings.snapshot_path;
        match self.shell.snapshot(path) {
            Ok(true) => {}
            Ok(false) => log::warn!("Snapshot needs the {} backend", Backend::Imaging),
            Err(e) => log::error!("Failed to write snapshot {:?}: {}", path, e),
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Digit1 | KeyCode::Numpad1 => self.select_backend(Some(Backend::Vector)),
            KeyCode::Digit2 | KeyCode::Numpad2 => self.select_backend(Some(Backend::Imaging)),
            KeyCode::Digit3 | KeyCode::Numpad3 => self.select_backend(Some(Backend::Gpu)),
            KeyCode::Tab => self.select_backend(None),
            KeyCode::F12 => self.save_snapshot(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = self.settings.window_size();
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(self.shell.title())
                .with_inner_size(PhysicalSize::new(size.width, size.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let display = match pollster::block_on(DisplayContext::new(window.clone())) {
            Ok(display) => display,
            Err(e) => {
                log::error!("Failed to initialize display: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.shell.init(&display);
        display.request_redraw();

        self.window = Some(window);
        self.display = Some(display);
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let StartCause::ResumeTimeReached { .. } = cause {
            if let Some(display) = &self.display {
                display.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let rect = ClientRect::from(size);
                if let Some(display) = self.display.as_mut() {
                    display.resize(rect);
                    self.shell.resize(display, rect);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::RedrawRequested => {
                if let Some(display) = &self.display {
                    let now = Instant::now();
                    self.shell.tick(display, now);
                    self.last_frame = now;
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Next idle frame once the pause after the last one has passed
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            self.last_frame + self.settings.idle_interval(),
        ));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(settings);

    log::info!("Clock Demo - keys: 1/2/3 select backend, Tab cycles, F12 saves a snapshot, Escape quits");
    event_loop
        .run_app(&mut app)
        .context("Event loop exited with an error")?;

    Ok(())
}
