use std::rc::Rc;

use bytemuck::Pod;
use glow::HasContext;
use indexmap::map::Entry;
use indexmap::IndexMap;

use super::config::{ClearValues, RasterizerConfig};
use crate::error::{gl_size, Error, Result};
use crate::gl::Gl;
use crate::resources::{
    PixelElement, Program, ProgramInterface, RenderTargets, ResourceProperty, ShaderStage,
    StorageBuffer,
};

type SetMatrix = fn(&glow::Context, Option<&glow::NativeUniformLocation>, bool, &[f32]);

/// A uniform matrix type a value can be set for.
struct MatrixType {
    gl_type: u32,
    columns: u32,
    rows: u32,
    set: SetMatrix,
}

const MATRIX_TYPES: [MatrixType; 9] = [
    MatrixType {
        gl_type: glow::FLOAT_MAT2,
        columns: 2,
        rows: 2,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_2_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT3,
        columns: 3,
        rows: 3,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_3_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT4,
        columns: 4,
        rows: 4,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_4_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT2x3,
        columns: 2,
        rows: 3,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_2x3_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT2x4,
        columns: 2,
        rows: 4,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_2x4_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT3x2,
        columns: 3,
        rows: 2,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_3x2_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT3x4,
        columns: 3,
        rows: 4,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_3x4_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT4x2,
        columns: 4,
        rows: 2,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_4x2_f32_slice(at, transpose, v) },
    },
    MatrixType {
        gl_type: glow::FLOAT_MAT4x3,
        columns: 4,
        rows: 3,
        set: |gl, at, transpose, v| unsafe { gl.uniform_matrix_4x3_f32_slice(at, transpose, v) },
    },
];

fn matrix_type(uniform_type: u32) -> Option<&'static MatrixType> {
    MATRIX_TYPES.iter().find(|matrix| matrix.gl_type == uniform_type)
}

/// Draws point primitives through a vertex → geometry → fragment program
/// into off-screen render targets and reads the result back.
///
/// Geometry is not passed as vertex attributes. Shaders pull it from named
/// storage blocks uploaded with [`Rasterizer::set_shader_storage_buffer`],
/// typically expanding one point per primitive in the geometry stage.
///
/// All methods must be called with the owning context current.
pub struct Rasterizer<T: PixelElement> {
    gl: Rc<Gl>,
    program: Program,
    render_targets: RenderTargets<T>,
    storage_buffers: IndexMap<String, StorageBuffer>,
    clear: ClearValues,
}

impl<T: PixelElement> Rasterizer<T> {
    /// Links the program and creates the render targets. Nothing is kept if
    /// either step fails.
    pub fn new(gl: Rc<Gl>, config: &RasterizerConfig) -> Result<Self> {
        let program = Program::new(
            Rc::clone(&gl),
            &[
                (config.vertex_shader.as_str(), ShaderStage::Vertex),
                (config.geometry_shader.as_str(), ShaderStage::Geometry),
                (config.fragment_shader.as_str(), ShaderStage::Fragment),
            ],
        )?;
        let render_targets = RenderTargets::new(Rc::clone(&gl), config.width, config.height)?;

        Ok(Self {
            gl,
            program,
            render_targets,
            storage_buffers: IndexMap::new(),
            clear: config.clear,
        })
    }

    /// Uploads `data` to the storage buffer called `name`, creating it on
    /// first use.
    ///
    /// The name does not have to match a block of the program; buffers the
    /// program does not declare are ignored when rendering.
    pub fn set_shader_storage_buffer<D: Pod>(&mut self, name: &str, data: &[D]) -> Result<()> {
        let buffer = match self.storage_buffers.entry(name.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(StorageBuffer::new(Rc::clone(&self.gl))?),
        };
        buffer.upload(data)
    }

    /// Sets the matrix uniform `name` from `values`.
    ///
    /// `columns` and `rows` must match the uniform's declared type. Values are
    /// read column by column unless `transpose` is set.
    pub fn set_uniform_matrix(
        &mut self,
        name: &str,
        columns: u32,
        rows: u32,
        transpose: bool,
        values: &[f32],
    ) -> Result<()> {
        if columns as usize * rows as usize != values.len() {
            return Err(Error::invalid(format!(
                "{columns}x{rows} matrix needs {} values, got {}",
                columns as usize * rows as usize,
                values.len()
            )));
        }

        let properties = self.program.resource_properties(
            name,
            ProgramInterface::Uniform,
            &[ResourceProperty::Type, ResourceProperty::Location],
        )?;
        let (uniform_type, location) = (properties[0] as u32, properties[1]);

        let matrix = matrix_type(uniform_type).ok_or_else(|| {
            Error::UnsupportedType(format!(
                "uniform `{name}` has non-matrix type 0x{uniform_type:04X}"
            ))
        })?;
        if (matrix.columns, matrix.rows) != (columns, rows) {
            return Err(Error::invalid(format!(
                "uniform `{name}` is a {}x{} matrix, got {columns}x{rows}",
                matrix.columns, matrix.rows
            )));
        }
        let location = u32::try_from(location)
            .map(glow::NativeUniformLocation)
            .map_err(|_| Error::invalid(format!("uniform `{name}` has no location")))?;

        let _active = self.program.activate()?;
        self.gl.call("glUniformMatrix", |gl| {
            (matrix.set)(gl, Some(&location), transpose, values)
        })
    }

    /// Sets a `mat4` uniform.
    pub fn set_uniform_mat4(&mut self, name: &str, matrix: glam::Mat4) -> Result<()> {
        self.set_uniform_matrix(name, 4, 4, false, &matrix.to_cols_array())
    }

    /// Draws `vertex_count` points and reads the color buffer into `pixels`,
    /// which must hold `width * height * 4` elements.
    pub fn render(&mut self, vertex_count: u32, pixels: &mut [T]) -> Result<()> {
        let expected = self.width() as usize * self.height() as usize * 4;
        if pixels.len() != expected {
            return Err(Error::invalid(format!(
                "pixel buffer holds {} elements, expected {expected}",
                pixels.len()
            )));
        }
        let count = i32::try_from(vertex_count).map_err(|_| {
            Error::invalid(format!("vertex count {vertex_count} exceeds the GL range"))
        })?;

        for (name, buffer) in &self.storage_buffers {
            let slot = match self.program.resource_property(
                name,
                ProgramInterface::ShaderStorageBlock,
                ResourceProperty::BufferBinding,
            ) {
                Ok(slot) => slot,
                Err(err) if err.is_not_found() => {
                    log::trace!("program does not read storage buffer `{name}`");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let slot = u32::try_from(slot)
                .map_err(|_| Error::invalid(format!("storage block `{name}` has binding {slot}")))?;
            buffer.bind_base(slot)?;
        }

        let gl = &self.gl;
        gl.call("glDisable", |gl| unsafe { gl.disable(glow::BLEND) })?;
        gl.call("glEnable", |gl| unsafe { gl.enable(glow::DEPTH_TEST) })?;
        gl.call("glDisable", |gl| unsafe { gl.disable(glow::CULL_FACE) })?;

        let _active = self.program.activate()?;
        self.render_targets.bind_framebuffer()?;

        let (w, h) = (gl_size(self.width(), "width")?, gl_size(self.height(), "height")?);
        let [r, g, b] = self.clear.color;
        gl.call("glViewport", |gl| unsafe { gl.viewport(0, 0, w, h) })?;
        gl.call("glClearColor", |gl| unsafe { gl.clear_color(r, g, b, 1.0) })?;
        gl.call("glClearDepthf", |gl| unsafe { gl.clear_depth_f32(self.clear.depth) })?;
        gl.call("glClear", |gl| unsafe {
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT)
        })?;

        gl.call("glDrawArrays", |gl| unsafe { gl.draw_arrays(glow::POINTS, 0, count) })?;
        log::trace!("drew {vertex_count} point(s) into {w}x{h} targets");

        self.render_targets.read_pixels(pixels)
    }

    pub fn width(&self) -> u32 {
        self.render_targets.width()
    }

    pub fn height(&self) -> u32 {
        self.render_targets.height()
    }

    pub fn clear_values(&self) -> ClearValues {
        self.clear
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}

impl<T: PixelElement> std::fmt::Debug for Rasterizer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("render_targets", &self.render_targets)
            .field("storage_buffers", &self.storage_buffers.keys().collect::<Vec<_>>())
            .field("clear", &self.clear)
            .finish()
    }
}
