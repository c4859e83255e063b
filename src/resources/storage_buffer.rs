use std::rc::Rc;

use bytemuck::Pod;
use glow::HasContext;

use crate::error::Result;
use crate::gl::Gl;

/// General-purpose GPU buffer read by shaders as a storage block.
pub struct StorageBuffer {
    gl: Rc<Gl>,
    raw: glow::Buffer,
    len_bytes: usize,
}

impl StorageBuffer {
    pub fn new(gl: Rc<Gl>) -> Result<Self> {
        let raw = gl.create("storage buffer", |gl| unsafe { gl.create_buffer() })?;
        Ok(Self { gl, raw, len_bytes: 0 })
    }

    /// Replaces the buffer's contents with `data`.
    pub fn upload<D: Pod>(&mut self, data: &[D]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.gl.call("glBindBuffer", |gl| unsafe {
            gl.bind_buffer(glow::SHADER_STORAGE_BUFFER, Some(self.raw))
        })?;
        let uploaded = self.gl.call("glBufferData", |gl| unsafe {
            gl.buffer_data_u8_slice(glow::SHADER_STORAGE_BUFFER, bytes, glow::DYNAMIC_COPY)
        });
        // The generic binding point is cleared on every path.
        let unbound = self.gl.call("glBindBuffer", |gl| unsafe {
            gl.bind_buffer(glow::SHADER_STORAGE_BUFFER, None)
        });
        uploaded?;
        unbound?;

        self.len_bytes = bytes.len();
        log::trace!("uploaded {} bytes to storage buffer", bytes.len());
        Ok(())
    }

    /// Binds the buffer to the indexed storage binding point `index`.
    pub fn bind_base(&self, index: u32) -> Result<()> {
        self.gl.call("glBindBufferBase", |gl| unsafe {
            gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, index, Some(self.raw))
        })
    }

    /// Size of the last upload.
    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }
}

impl Drop for StorageBuffer {
    fn drop(&mut self) {
        let deleted = self
            .gl
            .call("glDeleteBuffers", |gl| unsafe { gl.delete_buffer(self.raw) });
        if let Err(err) = deleted {
            log::warn!("failed to delete storage buffer: {err}");
        }
    }
}

impl std::fmt::Debug for StorageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBuffer")
            .field("raw", &self.raw)
            .field("len_bytes", &self.len_bytes)
            .finish()
    }
}
