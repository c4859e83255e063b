//! Headless rendering contexts.
//!
//! An [`OffscreenContext`] owns an EGL context attached to a pixel-buffer
//! surface. Nothing is ever presented; results are read back from frame
//! buffers created while the context is current.

mod config;
mod library;
mod offscreen;

pub use config::{ContextConfig, RenderingApi};
pub use library::EglLibrary;
pub use offscreen::{CurrentContext, OffscreenContext};
