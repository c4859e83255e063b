// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "headless-raster")]
#[command(about = "Headless EGL rasterizer probe", long_about = None)]
pub struct Cli {
    /// Width of the render targets
    #[arg(long, default_value_t = 4)]
    pub width: u32,

    /// Height of the render targets
    #[arg(long, default_value_t = 4)]
    pub height: u32,

    /// Clear color as three comma-separated components
    #[arg(long, value_delimiter = ',', default_values_t = [0.25, 0.5, 0.75])]
    pub clear_color: Vec<f32>,

    /// Element type of the color buffer
    #[arg(long, value_enum, default_value_t = PixelFormat::F32)]
    pub format: PixelFormat,

    /// JSON rasterizer configuration; overrides the size and clear flags
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    U8,
    F32,
}
