use std::marker::PhantomData;
use std::rc::Rc;

use glow::HasContext;

use super::PixelElement;
use crate::error::{gl_size, Error, Result};
use crate::gl::Gl;
use crate::rollback::Rollback;

/// Frame buffer with a color and a depth render buffer attached.
///
/// The color buffer stores RGBA with `T`'s precision; depth is always 24 bit.
pub struct RenderTargets<T: PixelElement> {
    gl: Rc<Gl>,
    width: u32,
    height: u32,
    color: glow::Renderbuffer,
    depth: glow::Renderbuffer,
    frame_buffer: glow::Framebuffer,
    _element: PhantomData<T>,
}

impl<T: PixelElement> RenderTargets<T> {
    /// Creates the render buffers and the frame buffer, and leaves the frame
    /// buffer bound.
    pub fn new(gl: Rc<Gl>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!(
                "render targets must be at least 1x1, got {width}x{height}"
            )));
        }
        let (w, h) = (gl_size(width, "width")?, gl_size(height, "height")?);

        let mut rollback = Rollback::new();
        let gl_ref = &gl;

        let color = renderbuffer(gl_ref, T::INTERNAL_FORMAT, w, h)?;
        rollback.defer(move || delete_renderbuffer(gl_ref, color));

        let depth = renderbuffer(gl_ref, glow::DEPTH_COMPONENT24, w, h)?;
        rollback.defer(move || delete_renderbuffer(gl_ref, depth));

        let frame_buffer = gl.create("frame buffer", |gl| unsafe { gl.create_framebuffer() })?;
        rollback.defer(move || {
            let deleted = gl_ref.call("glDeleteFramebuffers", |gl| unsafe {
                gl.delete_framebuffer(frame_buffer)
            });
            if let Err(err) = deleted {
                log::warn!("frame buffer rollback failed: {err}");
            }
        });

        gl.call("glBindFramebuffer", |gl| unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(frame_buffer))
        })?;
        gl.call("glFramebufferRenderbuffer", |gl| unsafe {
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(color),
            )
        })?;
        gl.call("glFramebufferRenderbuffer", |gl| unsafe {
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            )
        })?;

        let status = gl.call("glCheckFramebufferStatus", |gl| unsafe {
            gl.check_framebuffer_status(glow::FRAMEBUFFER)
        })?;
        if status != glow::FRAMEBUFFER_COMPLETE {
            return Err(Error::IncompleteFramebuffer { status });
        }

        rollback.disarm();
        log::debug!("created {width}x{height} render targets ({})", T::NAME);

        Ok(Self {
            gl,
            width,
            height,
            color,
            depth,
            frame_buffer,
            _element: PhantomData,
        })
    }

    pub fn bind_framebuffer(&self) -> Result<()> {
        self.gl.call("glBindFramebuffer", |gl| unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.frame_buffer))
        })
    }

    /// Copies the color buffer into `pixels`, row by row from the bottom,
    /// four components per pixel.
    pub fn read_pixels(&self, pixels: &mut [T]) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::invalid(format!(
                "pixel buffer holds {} elements, {}x{} RGBA needs {expected}",
                pixels.len(),
                self.width,
                self.height
            )));
        }
        let (w, h) = (gl_size(self.width, "width")?, gl_size(self.height, "height")?);

        self.gl.call("glBindFramebuffer", |gl| unsafe {
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(self.frame_buffer))
        })?;
        self.gl.call("glReadPixels", |gl| unsafe {
            gl.read_pixels(
                0,
                0,
                w,
                h,
                glow::RGBA,
                T::TRANSFER_TYPE,
                glow::PixelPackData::Slice(Some(bytemuck::cast_slice_mut(pixels))),
            )
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl<T: PixelElement> Drop for RenderTargets<T> {
    fn drop(&mut self) {
        if let Err(err) = self
            .gl
            .call("glDeleteFramebuffers", |gl| unsafe { gl.delete_framebuffer(self.frame_buffer) })
        {
            log::warn!("failed to delete frame buffer: {err}");
        }
        delete_renderbuffer(&self.gl, self.depth);
        delete_renderbuffer(&self.gl, self.color);
    }
}

impl<T: PixelElement> std::fmt::Debug for RenderTargets<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTargets")
            .field("element", &T::NAME)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

fn renderbuffer(gl: &Gl, format: u32, width: i32, height: i32) -> Result<glow::Renderbuffer> {
    let buffer = gl.create("render buffer", |gl| unsafe { gl.create_renderbuffer() })?;
    let storage = gl
        .call("glBindRenderbuffer", |gl| unsafe {
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(buffer))
        })
        .and_then(|()| {
            gl.call("glRenderbufferStorage", |gl| unsafe {
                gl.renderbuffer_storage(glow::RENDERBUFFER, format, width, height)
            })
        });
    if let Err(err) = storage {
        delete_renderbuffer(gl, buffer);
        return Err(err);
    }
    Ok(buffer)
}

fn delete_renderbuffer(gl: &Gl, buffer: glow::Renderbuffer) {
    let deleted = gl.call("glDeleteRenderbuffers", |gl| unsafe { gl.delete_renderbuffer(buffer) });
    if let Err(err) = deleted {
        log::warn!("failed to delete render buffer: {err}");
    }
}
