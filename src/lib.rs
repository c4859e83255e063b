//! Headless rasterization on top of EGL and OpenGL.
//!
//! An [`OffscreenContext`] provides a GPU context without a window. Under it,
//! a [`Rasterizer`] draws point primitives through a vertex, geometry and
//! fragment program into off-screen render targets and reads the pixels back.
//! [`ContextBoundRasterizer`] bundles both so a worker thread can own one, and
//! [`RasterizeOp`] serves concurrent callers from a pool of them.

pub mod cli;
pub mod context;
pub mod error;
pub mod gl;
pub mod op;
pub mod pool;
pub mod rasterizer;
pub mod resources;

mod rollback;

pub use context::{ContextConfig, CurrentContext, OffscreenContext, RenderingApi};
pub use error::{Error, ErrorKind, NativeApi, Result};
pub use gl::Gl;
pub use op::{Image, RasterizeConfig, RasterizeOp, VariableKind, VariableSpec, VariableValue};
pub use pool::{Pooled, ResourcePool};
pub use rasterizer::{ClearValues, ContextBoundRasterizer, Rasterizer, RasterizerConfig};
pub use resources::{
    ActiveProgram, PixelElement, Program, ProgramInterface, RenderTargets, ResourceProperty,
    ShaderStage, StorageBuffer,
};

pub use glow;
pub use khronos_egl;
