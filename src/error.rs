use std::fmt;
use std::panic::Location;

use thiserror::Error;

use crate::resources::ProgramInterface;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Callers branch on this rather than on individual variants, e.g. the render
/// pass treats `NotFound` as "this program variant does not use that buffer".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A native EGL/GL call reported a failure.
    Native,
    /// Size, type or dimension mismatch in caller-supplied arguments.
    InvalidArgument,
    /// A queried resource name is not active in the program.
    NotFound,
    /// The operation does not support the type it was invoked with.
    UnsupportedType,
}

/// Native API an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeApi {
    Egl,
    Gl,
}

impl fmt::Display for NativeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeApi::Egl => f.write_str("EGL"),
            NativeApi::Gl => f.write_str("GL"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load the EGL library: {0}")]
    Library(String),

    #[error("no EGL display is available")]
    NoDisplay,

    #[error("EGL call `{call}` failed: {source} (at {location})")]
    Egl {
        call: &'static str,
        #[source]
        source: khronos_egl::Error,
        location: &'static Location<'static>,
    },

    #[error("GL call `{call}` failed with GL error 0x{code:04X} (at {location})")]
    Gl {
        call: &'static str,
        code: u32,
        location: &'static Location<'static>,
    },

    #[error("expected exactly one EGL frame buffer configuration, driver returned {returned}")]
    ConfigSelection { returned: usize },

    #[error("failed to create {object}: {reason} (at {location})")]
    ObjectCreation {
        object: &'static str,
        reason: String,
        location: &'static Location<'static>,
    },

    #[error("failed to compile {stage:?} shader: {log} (at {location})")]
    Compile {
        stage: crate::resources::ShaderStage,
        log: String,
        location: &'static Location<'static>,
    },

    #[error("failed to link program: {log} (at {location})")]
    Link {
        log: String,
        location: &'static Location<'static>,
    },

    #[error("frame buffer is incomplete: status 0x{status:04X}")]
    IncompleteFramebuffer { status: u32 },

    #[error("query on `{name}` returned {returned} values, {requested} requested")]
    IncompleteQuery {
        name: String,
        requested: usize,
        returned: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no active {interface} resource named `{name}`")]
    NotFound {
        name: String,
        interface: ProgramInterface,
    },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),
}

impl Error {
    #[track_caller]
    pub(crate) fn egl(call: &'static str, source: khronos_egl::Error) -> Self {
        Error::Egl {
            call,
            source,
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub(crate) fn gl(call: &'static str, code: u32) -> Self {
        Error::Gl {
            call,
            code,
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub(crate) fn creation(object: &'static str, reason: impl Into<String>) -> Self {
        Error::ObjectCreation {
            object,
            reason: reason.into(),
            location: Location::caller(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::Library(_)
            | Error::NoDisplay
            | Error::Egl { .. }
            | Error::Gl { .. }
            | Error::ConfigSelection { .. }
            | Error::ObjectCreation { .. }
            | Error::Compile { .. }
            | Error::Link { .. }
            | Error::IncompleteFramebuffer { .. }
            | Error::IncompleteQuery { .. } => ErrorKind::Native,
        }
    }

    /// Native API the failure came from, if any.
    pub fn native_api(&self) -> Option<NativeApi> {
        match self {
            Error::Library(_)
            | Error::NoDisplay
            | Error::Egl { .. }
            | Error::ConfigSelection { .. } => Some(NativeApi::Egl),
            Error::Gl { .. }
            | Error::ObjectCreation { .. }
            | Error::Compile { .. }
            | Error::Link { .. }
            | Error::IncompleteFramebuffer { .. }
            | Error::IncompleteQuery { .. } => Some(NativeApi::Gl),
            _ => None,
        }
    }

    /// Source location of the native call that failed.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Error::Egl { location, .. }
            | Error::Gl { location, .. }
            | Error::ObjectCreation { location, .. }
            | Error::Compile { location, .. }
            | Error::Link { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Converts a caller-facing size to the `GLsizei` the driver expects.
pub(crate) fn gl_size(value: u32, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| Error::invalid(format!("{what} {value} exceeds the GL size range")))
}
