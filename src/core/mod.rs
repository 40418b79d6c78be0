pub mod blit;
pub mod clock;
pub mod display_context;
pub mod fps;
pub mod gpu_context;
pub mod window;

pub use clock::{ClockState, FixedClock, HandAngles, LocalClock, WallClock, YAxis};
pub use display_context::DisplayContext;
pub use fps::FpsCounter;
pub use window::{ClientRect, WindowContext};
