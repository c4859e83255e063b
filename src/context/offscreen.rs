use std::cell::OnceCell;
use std::rc::Rc;

use khronos_egl as egl;

use super::config::ContextConfig;
use super::library::{self, EglLibrary};
use crate::error::{Error, Result};
use crate::gl::Gl;
use crate::rollback::Rollback;

/// A GPU rendering context bound to an invisible pixel-buffer surface.
///
/// The context can be current on at most one thread at a time. It is neither
/// `Clone` nor `Send`: whoever creates it owns it, and every GPU object built
/// while it is current must be dropped while it is current again.
///
/// Dropping the context releases it if it is current on the calling thread,
/// then destroys the context, the surface and the display, in that order.
pub struct OffscreenContext {
    lib: &'static EglLibrary,
    display: egl::Display,
    surface: egl::Surface,
    context: egl::Context,
    width: u32,
    height: u32,
    gl: OnceCell<Rc<Gl>>,
}

impl OffscreenContext {
    pub fn new(config: &ContextConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::invalid(format!(
                "pixel buffer size must be at least 1x1, got {}x{}",
                config.width, config.height
            )));
        }
        let pbuffer_attributes = config.pbuffer_attributes()?;

        let lib = library::library()?;
        let egl = lib.instance();

        let display = library::acquire_display(lib)?;
        let mut rollback = Rollback::new();
        rollback.defer(move || {
            if let Err(err) = library::release_display(lib, display) {
                log::warn!("display rollback failed: {err}");
            }
        });

        egl.bind_api(config.api.to_egl())
            .map_err(|e| Error::egl("eglBindAPI", e))?;

        let mut configs = Vec::with_capacity(1);
        egl.choose_config(display, &config.terminated_config_attributes(), &mut configs)
            .map_err(|e| Error::egl("eglChooseConfig", e))?;
        if configs.len() != 1 {
            return Err(Error::ConfigSelection {
                returned: configs.len(),
            });
        }
        let frame_buffer_config = configs[0];

        let surface = egl
            .create_pbuffer_surface(display, frame_buffer_config, &pbuffer_attributes)
            .map_err(|e| Error::egl("eglCreatePbufferSurface", e))?;
        rollback.defer(move || {
            if let Err(err) = egl.destroy_surface(display, surface) {
                log::warn!("surface rollback failed: {err}");
            }
        });

        let context_attributes = config.terminated_context_attributes();
        let context = egl
            .create_context(display, frame_buffer_config, None, &context_attributes)
            .map_err(|e| Error::egl("eglCreateContext", e))?;

        rollback.disarm();
        log::debug!(
            "created offscreen context {}x{} ({:?})",
            config.width,
            config.height,
            config.api
        );

        Ok(Self {
            lib,
            display,
            surface,
            context,
            width: config.width,
            height: config.height,
            gl: OnceCell::new(),
        })
    }

    /// Binds this context and its surface (read and draw) to the calling
    /// thread.
    pub fn make_current(&self) -> Result<()> {
        self.lib
            .instance()
            .make_current(
                self.display,
                Some(self.surface),
                Some(self.surface),
                Some(self.context),
            )
            .map_err(|e| Error::egl("eglMakeCurrent", e))?;

        if self.gl.get().is_none() {
            let gl = unsafe { Gl::load(self.lib) };
            log::debug!("GL ready: {} on {}", gl.version_string(), gl.renderer_string());
            let _ = self.gl.set(Rc::new(gl));
        }
        Ok(())
    }

    /// Unbinds this context if it is current on the calling thread; otherwise
    /// does nothing.
    pub fn release(&self) -> Result<()> {
        if self.is_current() {
            self.lib
                .instance()
                .make_current(self.display, None, None, None)
                .map_err(|e| Error::egl("eglMakeCurrent", e))?;
        }
        Ok(())
    }

    pub fn is_current(&self) -> bool {
        self.lib.instance().get_current_context() == Some(self.context)
    }

    /// Makes the context current for the lifetime of the returned guard.
    pub fn bind(&self) -> Result<CurrentContext<'_>> {
        self.make_current()?;
        let gl = self.gl()?;
        Ok(CurrentContext {
            context: self,
            gl,
            released: false,
        })
    }

    /// GL function table of this context.
    ///
    /// Available once the context has been made current at least once.
    pub fn gl(&self) -> Result<Rc<Gl>> {
        self.gl
            .get()
            .cloned()
            .ok_or_else(|| Error::invalid("context has never been made current"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn destroy(&mut self) -> Result<()> {
        self.release()?;
        let egl = self.lib.instance();
        egl.destroy_context(self.display, self.context)
            .map_err(|e| Error::egl("eglDestroyContext", e))?;
        egl.destroy_surface(self.display, self.surface)
            .map_err(|e| Error::egl("eglDestroySurface", e))?;
        library::release_display(self.lib, self.display)
    }
}

impl Drop for OffscreenContext {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::error!("failed to tear down offscreen context: {err}");
            std::process::abort();
        }
        log::debug!("destroyed offscreen context {}x{}", self.width, self.height);
    }
}

impl std::fmt::Debug for OffscreenContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffscreenContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("gl_loaded", &self.gl.get().is_some())
            .finish()
    }
}

/// Scope during which an [`OffscreenContext`] is current on this thread.
///
/// Dropping the guard releases the context, on early returns as well.
pub struct CurrentContext<'a> {
    context: &'a OffscreenContext,
    gl: Rc<Gl>,
    released: bool,
}

impl CurrentContext<'_> {
    pub fn gl(&self) -> &Rc<Gl> {
        &self.gl
    }

    pub fn context(&self) -> &OffscreenContext {
        self.context
    }

    /// Releases the context now, reporting a failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.context.release()
    }
}

impl Drop for CurrentContext<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.context.release() {
            log::warn!("failed to release offscreen context: {err}");
        }
    }
}
