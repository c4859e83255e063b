//! GPU objects owned under an [`OffscreenContext`](crate::OffscreenContext).
//!
//! Every type here holds the context's GL table and deletes its native object
//! on drop, so it must be created and dropped while that context is current.

mod pixel;
mod program;
mod render_targets;
mod storage_buffer;

pub use pixel::PixelElement;
pub use program::{ActiveProgram, Program, ProgramInterface, ResourceProperty, ShaderStage};
pub use render_targets::RenderTargets;
pub use storage_buffer::StorageBuffer;
