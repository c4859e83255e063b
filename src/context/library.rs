use std::collections::HashMap;
use std::sync::OnceLock;

use khronos_egl as egl;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Runtime-loaded `libEGL`.
pub struct EglLibrary {
    instance: egl::DynamicInstance<egl::EGL1_4>,
}

// SAFETY: EGL entry points are required to be callable from any thread; the
// instance only holds the library handle and resolved function pointers.
unsafe impl Send for EglLibrary {}
unsafe impl Sync for EglLibrary {}

impl EglLibrary {
    pub(crate) fn instance(&self) -> &egl::DynamicInstance<egl::EGL1_4> {
        &self.instance
    }
}

static LIBRARY: OnceLock<std::result::Result<EglLibrary, String>> = OnceLock::new();

/// Loads `libEGL` on first use and returns the process-wide handle.
pub(crate) fn library() -> Result<&'static EglLibrary> {
    LIBRARY
        .get_or_init(|| {
            let loaded = unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required() };
            match loaded {
                Ok(instance) => {
                    log::debug!("loaded libEGL");
                    Ok(EglLibrary { instance })
                }
                Err(err) => Err(err.to_string()),
            }
        })
        .as_ref()
        .map_err(|reason| Error::Library(reason.clone()))
}

/// Number of live contexts per initialized display.
///
/// `eglGetDisplay(EGL_DEFAULT_DISPLAY)` hands every caller the same display,
/// and `eglTerminate` invalidates all contexts created on it, so the display is
/// terminated only when its last user is gone.
static DISPLAY_USERS: Mutex<Option<HashMap<usize, usize>>> = Mutex::new(None);

pub(crate) fn acquire_display(lib: &EglLibrary) -> Result<egl::Display> {
    let display =
        unsafe { lib.instance().get_display(egl::DEFAULT_DISPLAY) }.ok_or(Error::NoDisplay)?;

    let mut users = DISPLAY_USERS.lock();
    let count = users
        .get_or_insert_with(HashMap::new)
        .entry(display.as_ptr() as usize)
        .or_insert(0);
    if *count == 0 {
        let (major, minor) = lib
            .instance()
            .initialize(display)
            .map_err(|e| Error::egl("eglInitialize", e))?;
        log::debug!("initialized EGL display {major}.{minor}");
    }
    *count += 1;
    Ok(display)
}

pub(crate) fn release_display(lib: &EglLibrary, display: egl::Display) -> Result<()> {
    let mut users = DISPLAY_USERS.lock();
    let key = display.as_ptr() as usize;
    let Some(count) = users.as_mut().and_then(|map| map.get_mut(&key)) else {
        return Err(Error::invalid("display released more often than it was acquired"));
    };

    *count -= 1;
    if *count == 0 {
        if let Some(map) = users.as_mut() {
            map.remove(&key);
        }
        lib.instance()
            .terminate(display)
            .map_err(|e| Error::egl("eglTerminate", e))?;
        log::debug!("terminated EGL display");
    }
    Ok(())
}
