use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use glow::HasContext;

use crate::error::{Error, Result};
use crate::gl::Gl;
use crate::rollback::Rollback;

/// Programmable pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub fn to_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }
}

impl TryFrom<u32> for ShaderStage {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            glow::VERTEX_SHADER => Ok(ShaderStage::Vertex),
            glow::TESS_CONTROL_SHADER => Ok(ShaderStage::TessControl),
            glow::TESS_EVALUATION_SHADER => Ok(ShaderStage::TessEvaluation),
            glow::GEOMETRY_SHADER => Ok(ShaderStage::Geometry),
            glow::FRAGMENT_SHADER => Ok(ShaderStage::Fragment),
            glow::COMPUTE_SHADER => Ok(ShaderStage::Compute),
            other => Err(Error::invalid(format!("invalid shader stage 0x{other:04X}"))),
        }
    }
}

/// Program interface a named resource is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramInterface {
    Uniform,
    UniformBlock,
    ShaderStorageBlock,
}

impl ProgramInterface {
    pub fn to_gl(self) -> u32 {
        match self {
            ProgramInterface::Uniform => glow::UNIFORM,
            ProgramInterface::UniformBlock => glow::UNIFORM_BLOCK,
            ProgramInterface::ShaderStorageBlock => glow::SHADER_STORAGE_BLOCK,
        }
    }
}

impl fmt::Display for ProgramInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgramInterface::Uniform => "uniform",
            ProgramInterface::UniformBlock => "uniform block",
            ProgramInterface::ShaderStorageBlock => "shader storage block",
        })
    }
}

/// Property of a program resource, as queried by `glGetProgramResourceiv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceProperty {
    /// GL type enum of a uniform, e.g. `GL_FLOAT_MAT4`.
    Type,
    Location,
    ArraySize,
    /// Indexed binding point of a block.
    BufferBinding,
    /// Minimum buffer size, in bytes, backing a block.
    BufferDataSize,
}

impl ResourceProperty {
    pub fn to_gl(self) -> u32 {
        match self {
            ResourceProperty::Type => glow::TYPE,
            ResourceProperty::Location => glow::LOCATION,
            ResourceProperty::ArraySize => glow::ARRAY_SIZE,
            ResourceProperty::BufferBinding => glow::BUFFER_BINDING,
            ResourceProperty::BufferDataSize => glow::BUFFER_DATA_SIZE,
        }
    }
}

/// A linked shader program.
///
/// Owned GPU object: it must be dropped while the context it was created
/// under is current.
pub struct Program {
    gl: Rc<Gl>,
    raw: glow::Program,
}

impl Program {
    /// Compiles every `(source, stage)` pair, attaches the shaders and links.
    ///
    /// Shader objects never outlive this call. The program object is deleted
    /// again if any compile, attach or link step fails; compile and link
    /// failures carry the driver's info log.
    #[track_caller]
    pub fn new(gl: Rc<Gl>, stages: &[(&str, ShaderStage)]) -> Result<Self> {
        let location = Location::caller();
        let raw = gl.create("program", |gl| unsafe { gl.create_program() })?;

        let mut program_rollback = Rollback::new();
        program_rollback.defer(|| {
            if let Err(err) = gl.call("glDeleteProgram", |gl| unsafe { gl.delete_program(raw) }) {
                log::warn!("program rollback failed: {err}");
            }
        });

        let mut shader_cleanup = Rollback::new();
        for &(source, stage) in stages {
            let shader = gl.create("shader", |gl| unsafe { gl.create_shader(stage.to_gl()) })?;
            shader_cleanup.defer({
                let gl = &gl;
                move || {
                    let deleted =
                        gl.call("glDeleteShader", |gl| unsafe { gl.delete_shader(shader) });
                    if let Err(err) = deleted {
                        log::warn!("failed to delete {stage:?} shader: {err}");
                    }
                }
            });

            gl.call("glShaderSource", |gl| unsafe { gl.shader_source(shader, source) })?;
            gl.call("glCompileShader", |gl| unsafe { gl.compile_shader(shader) })?;
            let compiled = gl.call("glGetShaderiv", |gl| unsafe {
                gl.get_shader_compile_status(shader)
            })?;
            if !compiled {
                let log = gl.call("glGetShaderInfoLog", |gl| unsafe {
                    gl.get_shader_info_log(shader)
                })?;
                return Err(Error::Compile {
                    stage,
                    log,
                    location,
                });
            }

            gl.call("glAttachShader", |gl| unsafe { gl.attach_shader(raw, shader) })?;
            shader_cleanup.defer({
                let gl = &gl;
                move || {
                    let detached =
                        gl.call("glDetachShader", |gl| unsafe { gl.detach_shader(raw, shader) });
                    if let Err(err) = detached {
                        log::warn!("failed to detach {stage:?} shader: {err}");
                    }
                }
            });
        }

        gl.call("glLinkProgram", |gl| unsafe { gl.link_program(raw) })?;
        let linked = gl.call("glGetProgramiv", |gl| unsafe { gl.get_program_link_status(raw) })?;
        if !linked {
            let log = gl.call("glGetProgramInfoLog", |gl| unsafe { gl.get_program_info_log(raw) })?;
            return Err(Error::Link { log, location });
        }

        drop(shader_cleanup);
        program_rollback.disarm();
        log::debug!("linked program from {} shader stage(s)", stages.len());

        Ok(Self { gl, raw })
    }

    /// Queries `properties` of the resource `name` in `interface`.
    ///
    /// Uniform arrays match both `name` and `name[0]`.
    pub fn resource_properties(
        &self,
        name: &str,
        interface: ProgramInterface,
        properties: &[ResourceProperty],
    ) -> Result<Vec<i32>> {
        let index = self.resource_index(name, interface)?;
        let props: Vec<u32> = properties.iter().map(|p| p.to_gl()).collect();
        let values = self
            .gl
            .program_resource_i32(self.raw, interface.to_gl(), index, &props)?;

        if values.len() < properties.len() {
            return Err(Error::IncompleteQuery {
                name: name.to_owned(),
                requested: properties.len(),
                returned: values.len(),
            });
        }
        Ok(values)
    }

    pub fn resource_property(
        &self,
        name: &str,
        interface: ProgramInterface,
        property: ResourceProperty,
    ) -> Result<i32> {
        let values = self.resource_properties(name, interface, &[property])?;
        Ok(values[0])
    }

    fn resource_index(&self, name: &str, interface: ProgramInterface) -> Result<u32> {
        let index = match interface {
            ProgramInterface::Uniform => {
                let count = self
                    .gl
                    .call("glGetProgramiv", |gl| unsafe { gl.get_active_uniforms(self.raw) })?;
                let array_name = format!("{name}[0]");
                let mut found = None;
                for index in 0..count {
                    let uniform = self.gl.call("glGetActiveUniform", |gl| unsafe {
                        gl.get_active_uniform(self.raw, index)
                    })?;
                    if uniform.is_some_and(|u| u.name == name || u.name == array_name) {
                        found = Some(index);
                        break;
                    }
                }
                found
            }
            ProgramInterface::UniformBlock => {
                self.gl.call("glGetUniformBlockIndex", |gl| unsafe {
                    gl.get_uniform_block_index(self.raw, name)
                })?
            }
            ProgramInterface::ShaderStorageBlock => {
                self.gl.call("glGetProgramResourceIndex", |gl| unsafe {
                    gl.get_shader_storage_block_index(self.raw, name)
                })?
            }
        };

        index.ok_or_else(|| Error::NotFound {
            name: name.to_owned(),
            interface,
        })
    }

    /// Installs the program as part of the current rendering state.
    pub fn use_program(&self) -> Result<()> {
        self.gl.call("glUseProgram", |gl| unsafe { gl.use_program(Some(self.raw)) })
    }

    /// Like [`Program::use_program`], restoring "no program" when the guard
    /// drops.
    pub fn activate(&self) -> Result<ActiveProgram<'_>> {
        self.use_program()?;
        Ok(ActiveProgram { program: self })
    }

    pub fn raw(&self) -> glow::Program {
        self.raw
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        let deleted = self
            .gl
            .call("glDeleteProgram", |gl| unsafe { gl.delete_program(self.raw) });
        if let Err(err) = deleted {
            log::warn!("failed to delete program: {err}");
        }
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program").field("raw", &self.raw).finish()
    }
}

/// Keeps a [`Program`] installed until dropped.
pub struct ActiveProgram<'a> {
    program: &'a Program,
}

impl ActiveProgram<'_> {
    pub fn program(&self) -> &Program {
        self.program
    }
}

impl Drop for ActiveProgram<'_> {
    fn drop(&mut self) {
        let uninstalled = self
            .program
            .gl
            .call("glUseProgram", |gl| unsafe { gl.use_program(None) });
        if let Err(err) = uninstalled {
            log::warn!("failed to uninstall program: {err}");
        }
    }
}
