use std::ffi::c_void;

use glow::HasContext;

use crate::context::EglLibrary;
use crate::error::{Error, Result};

/// GL function table for one offscreen context.
///
/// Entry points are resolved through `eglGetProcAddress` once the owning
/// context is current for the first time. Calls through this table are only
/// meaningful while that context is current on the calling thread.
pub struct Gl {
    raw: glow::Context,
    get_program_resource_iv: Option<GetProgramResourceIv>,
}

type GetProgramResourceIv = unsafe extern "system" fn(
    program: u32,
    program_interface: u32,
    index: u32,
    prop_count: i32,
    props: *const u32,
    buf_size: i32,
    length: *mut i32,
    params: *mut i32,
);

/// Upper bound on error flags drained before a checked call; a driver keeps
/// at most one flag per error code.
const MAX_PENDING_ERRORS: usize = 8;

impl Gl {
    /// Resolves the GL entry points.
    ///
    /// # Safety
    /// The context these functions will be used with must be current on the
    /// calling thread; glow queries the GL version during loading.
    pub(crate) unsafe fn load(egl: &EglLibrary) -> Self {
        let raw = glow::Context::from_loader_function(|name| {
            egl.instance()
                .get_proc_address(name)
                .map_or(std::ptr::null(), |f| f as *const c_void)
        });
        // glow sizes the output of this query from a zero-sized first call,
        // which conforming drivers answer with a length of zero.
        let get_program_resource_iv = egl
            .instance()
            .get_proc_address("glGetProgramResourceiv")
            .map(|f| unsafe {
                std::mem::transmute::<extern "system" fn(), GetProgramResourceIv>(f)
            });
        Self {
            raw,
            get_program_resource_iv,
        }
    }

    /// Runs a GL call and converts a pending `glGetError` into an [`Error`]
    /// that records the caller's location.
    #[track_caller]
    pub(crate) fn call<R>(
        &self,
        name: &'static str,
        f: impl FnOnce(&glow::Context) -> R,
    ) -> Result<R> {
        self.drain_errors();
        let out = f(&self.raw);
        let code = unsafe { self.raw.get_error() };
        if code != glow::NO_ERROR {
            return Err(Error::gl(name, code));
        }
        Ok(out)
    }

    /// Like [`Gl::call`] for object constructors, which report failure through
    /// their return value as well as through `glGetError`.
    #[track_caller]
    pub(crate) fn create<O>(
        &self,
        object: &'static str,
        f: impl FnOnce(&glow::Context) -> std::result::Result<O, String>,
    ) -> Result<O> {
        match self.call(object, f)? {
            Ok(created) => Ok(created),
            Err(reason) => Err(Error::creation(object, reason)),
        }
    }

    /// Clears error flags left behind by unchecked calls so they are not
    /// blamed on the next checked one.
    fn drain_errors(&self) {
        for _ in 0..MAX_PENDING_ERRORS {
            let code = unsafe { self.raw.get_error() };
            if code == glow::NO_ERROR {
                return;
            }
            log::trace!("discarding stale GL error 0x{code:04X}");
        }
    }

    /// `glGetProgramResourceiv` with an output buffer of one value per
    /// requested property.
    #[track_caller]
    pub(crate) fn program_resource_i32(
        &self,
        program: glow::Program,
        interface: u32,
        index: u32,
        properties: &[u32],
    ) -> Result<Vec<i32>> {
        let Some(query) = self.get_program_resource_iv else {
            return Err(Error::creation(
                "program resource query",
                "glGetProgramResourceiv is not exported by the driver",
            ));
        };
        let count = i32::try_from(properties.len())
            .map_err(|_| Error::invalid("too many resource properties requested"))?;

        let mut values = vec![0i32; properties.len()];
        let mut written = 0i32;
        self.call("glGetProgramResourceiv", |_| unsafe {
            query(
                program.0.get(),
                interface,
                index,
                count,
                properties.as_ptr(),
                count,
                &mut written,
                values.as_mut_ptr(),
            )
        })?;
        values.truncate(usize::try_from(written).unwrap_or(0));
        Ok(values)
    }

    /// Unchecked access to the underlying table.
    pub fn raw(&self) -> &glow::Context {
        &self.raw
    }

    /// `GL_VERSION` string reported by the driver.
    pub fn version_string(&self) -> String {
        unsafe { self.raw.get_parameter_string(glow::VERSION) }
    }

    /// `GL_RENDERER` string reported by the driver.
    pub fn renderer_string(&self) -> String {
        unsafe { self.raw.get_parameter_string(glow::RENDERER) }
    }
}

impl std::fmt::Debug for Gl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gl").field("version", self.raw.version()).finish()
    }
}
