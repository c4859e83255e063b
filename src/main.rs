use std::fmt::Debug;

use anyhow::{ensure, Context, Result};
use clap::Parser;

use headless_raster::cli::{Cli, PixelFormat};
use headless_raster::{
    ContextBoundRasterizer, ContextConfig, OffscreenContext, PixelElement, RasterizerConfig,
};

// === Probe Shaders ===

const VERTEX_SHADER: &str = "#version 430\nvoid main() { }\n";

const GEOMETRY_SHADER: &str = "#version 430\n\
layout(points) in;\n\
layout(triangle_strip, max_vertices=3) out;\n\
void main() { }\n";

const FRAGMENT_SHADER: &str = "#version 430\n\
out vec4 output_color;\n\
void main() { output_color = vec4(1.0); }\n";

fn load_config(cli: &Cli) -> Result<RasterizerConfig> {
    if let Some(path) = &cli.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()));
    }

    ensure!(cli.clear_color.len() == 3, "--clear-color takes exactly three components");
    let config = RasterizerConfig::new(
        cli.width,
        cli.height,
        VERTEX_SHADER,
        GEOMETRY_SHADER,
        FRAGMENT_SHADER,
    );
    Ok(config.with_clear_color(cli.clear_color[0], cli.clear_color[1], cli.clear_color[2]))
}

fn report_driver() -> Result<()> {
    let context = OffscreenContext::new(&ContextConfig::with_size(1, 1))?;
    let current = context.bind()?;
    println!("GL version:  {}", current.gl().version_string());
    println!("GL renderer: {}", current.gl().renderer_string());
    current.release()?;
    Ok(())
}

/// Renders a frame without geometry, which leaves only the clear values.
fn probe<T: PixelElement>(config: &RasterizerConfig) -> Result<()> {
    let mut rasterizer = ContextBoundRasterizer::<T>::new(config).context("creating rasterizer")?;
    let mut pixels = vec![T::default(); config.width as usize * config.height as usize * 4];
    rasterizer.render(0, &mut pixels).context("rendering")?;

    let [r, g, b] = config.clear.color;
    let expected = [T::quantize(r), T::quantize(g), T::quantize(b), T::quantize(1.0)];
    println!("{}x{} {} pixels, first: {:?}", config.width, config.height, T::NAME, &pixels[..4]);
    print_mismatches(&pixels, &expected);
    Ok(())
}

fn print_mismatches<T: PartialEq + Debug>(pixels: &[T], expected: &[T; 4]) {
    let mismatched = pixels.chunks_exact(4).filter(|px| *px != expected).count();
    if mismatched == 0 {
        println!("all pixels hold the clear color {expected:?}");
    } else {
        println!("{mismatched} pixel(s) differ from the clear color {expected:?}");
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    report_driver().context("creating offscreen context")?;
    match cli.format {
        PixelFormat::U8 => probe::<u8>(&config),
        PixelFormat::F32 => probe::<f32>(&config),
    }
}
