use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::core::window::ClientRect;
use crate::render::Backend;
use crate::scene::LabelMode;

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_IDLE_MS: u64 = 10;

/// Startup settings: defaults, then the JSON file, then command-line flags
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    pub backend: Backend,
    pub label: LabelMode,
    pub idle_ms: u64,
    pub snapshot_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            backend: Backend::Vector,
            label: LabelMode::Text,
            idle_ms: DEFAULT_IDLE_MS,
            snapshot_path: PathBuf::from("clock.bmp"),
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid settings JSON")
    }

    /// Read a JSON settings file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Settings for this run: the `--config` file if given, then flag overrides
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply(cli);
        Ok(settings)
    }

    pub fn apply(&mut self, cli: &Cli) {
        if let Some(backend) = cli.backend {
            self.backend = backend;
        }
        if let Some(width) = cli.width {
            self.width = width;
        }
        if let Some(height) = cli.height {
            self.height = height;
        }
        if let Some(label) = cli.label {
            self.label = label;
        }
        if let Some(idle_ms) = cli.idle_ms {
            self.idle_ms = idle_ms;
        }
        if let Some(path) = &cli.snapshot {
            self.snapshot_path = path.clone();
        }
    }

    /// Initial client size, never empty
    pub fn window_size(&self) -> ClientRect {
        ClientRect::new(self.width.max(1), self.height.max(1))
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}
