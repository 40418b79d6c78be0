// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::render::Backend;
use crate::scene::LabelMode;

/// Command-line overrides; anything left out comes from the config file or defaults
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "clock-demo")]
#[command(about = "Analog clock drawn with interchangeable 2-D backends", long_about = None)]
pub struct Cli {
    /// Backend active at startup
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Initial client width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Initial client height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// What to draw in the top-left corner
    #[arg(long, value_enum)]
    pub label: Option<LabelMode>,

    /// Pause between idle frames in milliseconds
    #[arg(long = "idle-ms")]
    pub idle_ms: Option<u64>,

    /// Where F12 writes the BMP snapshot
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
