pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod pixels;
pub mod render;
pub mod scene;
pub mod shell;

pub use error::{RenderError, Result};
pub use render::{Backend, FrameParams, Renderer};
pub use shell::Shell;
