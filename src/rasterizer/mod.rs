//! Point-primitive render passes.
//!
//! [`Rasterizer`] works under a context the caller keeps current.
//! [`ContextBoundRasterizer`] owns its context and can be moved to a worker
//! thread.

mod bound;
mod config;
mod raster;

pub use bound::ContextBoundRasterizer;
pub use config::{ClearValues, RasterizerConfig};
pub use raster::Rasterizer;
