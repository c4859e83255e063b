use khronos_egl as egl;
use serde::{Deserialize, Serialize};

use crate::error::{gl_size, Result};

/// Client API the context is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderingApi {
    /// Desktop OpenGL (GLSL `#version 430` and up).
    #[default]
    OpenGl,
    /// OpenGL ES 3.x.
    OpenGlEs,
}

impl RenderingApi {
    pub(crate) fn to_egl(self) -> egl::Enum {
        match self {
            RenderingApi::OpenGl => egl::OPENGL_API,
            RenderingApi::OpenGlEs => egl::OPENGL_ES_API,
        }
    }

    pub(crate) fn renderable_bit(self) -> egl::Int {
        match self {
            RenderingApi::OpenGl => egl::OPENGL_BIT,
            RenderingApi::OpenGlEs => OPENGL_ES3_BIT,
        }
    }
}

const OPENGL_ES3_BIT: egl::Int = 0x0040;

/// Parameters of an [`OffscreenContext`](super::OffscreenContext).
///
/// Attribute lists use EGL's `key, value, ..., EGL_NONE` layout; a missing
/// terminator is appended when the list is handed to the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Width of the pixel-buffer surface.
    pub width: u32,
    /// Height of the pixel-buffer surface.
    pub height: u32,
    pub api: RenderingApi,
    /// Attributes passed to `eglChooseConfig`.
    pub config_attributes: Vec<egl::Int>,
    /// Attributes passed to `eglCreateContext`.
    pub context_attributes: Vec<egl::Int>,
}

impl ContextConfig {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Frame buffer configuration for a pbuffer-capable RGBA8 + depth24
    /// surface renderable with `api`.
    pub fn default_config_attributes(api: RenderingApi) -> Vec<egl::Int> {
        vec![
            egl::SURFACE_TYPE,
            egl::PBUFFER_BIT,
            egl::RENDERABLE_TYPE,
            api.renderable_bit(),
            egl::RED_SIZE,
            8,
            egl::GREEN_SIZE,
            8,
            egl::BLUE_SIZE,
            8,
            egl::ALPHA_SIZE,
            8,
            egl::DEPTH_SIZE,
            24,
            egl::NONE,
        ]
    }

    pub(crate) fn terminated_config_attributes(&self) -> Vec<egl::Int> {
        terminated(&self.config_attributes)
    }

    pub(crate) fn terminated_context_attributes(&self) -> Vec<egl::Int> {
        terminated(&self.context_attributes)
    }

    /// Surface size attributes; fails if a side does not fit an `EGLint`.
    pub(crate) fn pbuffer_attributes(&self) -> Result<Vec<egl::Int>> {
        Ok(vec![
            egl::WIDTH,
            gl_size(self.width, "surface width")?,
            egl::HEIGHT,
            gl_size(self.height, "surface height")?,
            egl::NONE,
        ])
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        let api = RenderingApi::default();
        Self {
            width: 800,
            height: 600,
            api,
            config_attributes: Self::default_config_attributes(api),
            context_attributes: vec![egl::NONE],
        }
    }
}

fn terminated(list: &[egl::Int]) -> Vec<egl::Int> {
    // Keys and values alternate, so a terminator can only sit at an even index.
    let mut out: Vec<egl::Int> = list
        .chunks(2)
        .take_while(|pair| pair[0] != egl::NONE)
        .flatten()
        .copied()
        .collect();
    out.push(egl::NONE);
    out
}
