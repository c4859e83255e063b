use std::rc::Rc;

use bytemuck::Pod;

use super::config::{ClearValues, RasterizerConfig};
use super::raster::Rasterizer;
use crate::context::{ContextConfig, OffscreenContext};
use crate::error::{Error, Result};
use crate::resources::PixelElement;

/// A [`Rasterizer`] together with the offscreen context it lives in.
///
/// Every call makes the context current for its duration and releases it
/// before returning, so the pair can be moved to another thread between
/// calls. It cannot be shared: all methods take `&mut self`.
pub struct ContextBoundRasterizer<T: PixelElement> {
    rasterizer: Option<Rasterizer<T>>,
    context: OffscreenContext,
}

// SAFETY: the GL table and every `Rc` clone of it stay inside this value, and
// each GPU call runs between `make_current` and `release` on the calling
// thread. Moving the whole value therefore moves all owners at once, and the
// context is never current anywhere while it is in transit.
unsafe impl<T: PixelElement> Send for ContextBoundRasterizer<T> {}

impl<T: PixelElement> ContextBoundRasterizer<T> {
    pub fn new(config: &RasterizerConfig) -> Result<Self> {
        Self::with_context_config(config, ContextConfig::default())
    }

    /// Like [`ContextBoundRasterizer::new`] with custom EGL attributes. The
    /// surface size always follows the render targets.
    pub fn with_context_config(
        config: &RasterizerConfig,
        context_config: ContextConfig,
    ) -> Result<Self> {
        let context = OffscreenContext::new(&ContextConfig {
            width: config.width,
            height: config.height,
            ..context_config
        })?;

        let current = context.bind()?;
        let rasterizer = Rasterizer::new(Rc::clone(current.gl()), config)?;
        current.release()?;

        Ok(Self {
            rasterizer: Some(rasterizer),
            context,
        })
    }

    pub fn render(&mut self, vertex_count: u32, pixels: &mut [T]) -> Result<()> {
        self.with_current(|rasterizer| rasterizer.render(vertex_count, pixels))
    }

    pub fn set_shader_storage_buffer<D: Pod>(&mut self, name: &str, data: &[D]) -> Result<()> {
        self.with_current(|rasterizer| rasterizer.set_shader_storage_buffer(name, data))
    }

    pub fn set_uniform_matrix(
        &mut self,
        name: &str,
        columns: u32,
        rows: u32,
        transpose: bool,
        values: &[f32],
    ) -> Result<()> {
        self.with_current(|rasterizer| {
            rasterizer.set_uniform_matrix(name, columns, rows, transpose, values)
        })
    }

    pub fn set_uniform_mat4(&mut self, name: &str, matrix: glam::Mat4) -> Result<()> {
        self.with_current(|rasterizer| rasterizer.set_uniform_mat4(name, matrix))
    }

    /// Frees the GPU resources of the rasterizer, keeping the context.
    ///
    /// Calls made afterwards fail with an invalid-argument error.
    pub fn reset(&mut self) -> Result<()> {
        if self.rasterizer.is_none() {
            return Ok(());
        }
        let current = self.context.bind()?;
        self.rasterizer = None;
        current.release()
    }

    pub fn width(&self) -> u32 {
        self.context.width()
    }

    pub fn height(&self) -> u32 {
        self.context.height()
    }

    pub fn clear_values(&self) -> Option<ClearValues> {
        self.rasterizer.as_ref().map(Rasterizer::clear_values)
    }

    fn with_current<R>(&mut self, f: impl FnOnce(&mut Rasterizer<T>) -> Result<R>) -> Result<R> {
        let rasterizer = self
            .rasterizer
            .as_mut()
            .ok_or_else(|| Error::invalid("rasterizer has been reset"))?;
        let current = self.context.bind()?;
        let out = f(rasterizer)?;
        current.release()?;
        Ok(out)
    }
}

impl<T: PixelElement> Drop for ContextBoundRasterizer<T> {
    fn drop(&mut self) {
        let Some(rasterizer) = self.rasterizer.take() else {
            return;
        };
        if let Err(err) = self.context.make_current() {
            log::error!("cannot make context current to free rasterizer resources: {err}");
            std::process::abort();
        }
        drop(rasterizer);
        if let Err(err) = self.context.release() {
            log::error!("failed to release context after freeing rasterizer: {err}");
            std::process::abort();
        }
    }
}

impl<T: PixelElement> std::fmt::Debug for ContextBoundRasterizer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBoundRasterizer")
            .field("rasterizer", &self.rasterizer)
            .field("context", &self.context)
            .finish()
    }
}
