use serde::{Deserialize, Serialize};

/// Values the render targets are cleared to before every draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearValues {
    /// Red, green and blue; alpha is always cleared to 1.
    pub color: [f32; 3],
    pub depth: f32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.0; 3],
            depth: 1.0,
        }
    }
}

/// Everything needed to build a [`Rasterizer`](super::Rasterizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterizerConfig {
    pub width: u32,
    pub height: u32,
    pub vertex_shader: String,
    pub geometry_shader: String,
    pub fragment_shader: String,
    #[serde(default)]
    pub clear: ClearValues,
}

impl RasterizerConfig {
    pub fn new(
        width: u32,
        height: u32,
        vertex_shader: impl Into<String>,
        geometry_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
    ) -> Self {
        Self {
            width,
            height,
            vertex_shader: vertex_shader.into(),
            geometry_shader: geometry_shader.into(),
            fragment_shader: fragment_shader.into(),
            clear: ClearValues::default(),
        }
    }

    pub fn with_clear_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.clear.color = [r, g, b];
        self
    }

    pub fn with_clear_depth(mut self, depth: f32) -> Self {
        self.clear.depth = depth;
        self
    }
}
