//! Rasterization driven by named variables.
//!
//! A [`RasterizeOp`] is configured once with shaders, an output size and the
//! names and kinds of the variables its shaders read. Each
//! [`RasterizeOp::compute`] call binds one value per variable onto a pooled
//! [`ContextBoundRasterizer`] and renders an RGBA float image. Calls may come
//! from any number of threads at once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pool::ResourcePool;
use crate::rasterizer::{ContextBoundRasterizer, RasterizerConfig};

/// How a variable reaches the shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    /// Matrix uniform.
    #[serde(rename = "mat")]
    Matrix,
    /// Shader storage block of floats.
    #[serde(rename = "buffer")]
    Buffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub kind: VariableKind,
}

impl VariableSpec {
    pub fn matrix(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Matrix,
        }
    }

    pub fn buffer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Buffer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterizeConfig {
    pub rasterizer: RasterizerConfig,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    /// Idle rasterizers kept between calls; one per logical CPU if unset.
    #[serde(default)]
    pub pool_capacity: Option<usize>,
}

/// Value bound to a variable for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableValue<'a> {
    /// Row-major `rows x cols` matrix.
    Matrix { rows: u32, cols: u32, data: &'a [f32] },
    Buffer(&'a [f32]),
}

impl VariableValue<'_> {
    fn kind(&self) -> VariableKind {
        match self {
            VariableValue::Matrix { .. } => VariableKind::Matrix,
            VariableValue::Buffer(_) => VariableKind::Buffer,
        }
    }
}

/// `height x width x 4` float image, bottom row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub height: u32,
    pub width: u32,
    pub data: Vec<f32>,
}

impl Image {
    /// RGBA components of the pixel at column `x` of row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(start..start + 4)
    }
}

pub struct RasterizeOp {
    pool: ResourcePool<ContextBoundRasterizer<f32>>,
    variables: Vec<VariableSpec>,
    width: u32,
    height: u32,
}

impl RasterizeOp {
    /// Validates the variable list and sets up the rasterizer pool.
    ///
    /// No GPU resource is created until the first [`RasterizeOp::compute`].
    pub fn new(config: RasterizeConfig) -> Result<Self> {
        let RasterizeConfig {
            rasterizer,
            variables,
            pool_capacity,
        } = config;

        if rasterizer.width == 0 || rasterizer.height == 0 {
            return Err(Error::invalid(format!(
                "output resolution must be positive, got {}x{}",
                rasterizer.width, rasterizer.height
            )));
        }
        let mut seen = HashSet::new();
        for variable in &variables {
            if variable.name.is_empty() {
                return Err(Error::invalid("variable names must not be empty"));
            }
            if !seen.insert(variable.name.as_str()) {
                return Err(Error::invalid(format!(
                    "variable `{}` is declared twice",
                    variable.name
                )));
            }
        }

        let (width, height) = (rasterizer.width, rasterizer.height);
        let creator = move || ContextBoundRasterizer::<f32>::new(&rasterizer);
        let pool = match pool_capacity {
            Some(capacity) => ResourcePool::new(creator, capacity),
            None => ResourcePool::with_default_capacity(creator),
        };

        Ok(Self {
            pool,
            variables,
            width,
            height,
        })
    }

    /// Renders `num_points` points with `values` bound to the configured
    /// variables, in declaration order.
    pub fn compute(&self, num_points: u32, values: &[VariableValue<'_>]) -> Result<Image> {
        self.check_values(values)?;

        let mut rasterizer = self.pool.acquire()?;
        let mut data = vec![0.0; self.width as usize * self.height as usize * 4];
        let rendered = self
            .bind_variables(&mut rasterizer, values)
            .and_then(|()| rasterizer.render(num_points, &mut data));
        if let Err(err) = rendered {
            rasterizer.discard();
            return Err(err);
        }

        Ok(Image {
            height: self.height,
            width: self.width,
            data,
        })
    }

    pub fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    pub fn pool(&self) -> &ResourcePool<ContextBoundRasterizer<f32>> {
        &self.pool
    }

    fn check_values(&self, values: &[VariableValue<'_>]) -> Result<()> {
        if values.len() != self.variables.len() {
            return Err(Error::invalid(format!(
                "{} variable(s) declared, {} value(s) given",
                self.variables.len(),
                values.len()
            )));
        }
        for (variable, value) in self.variables.iter().zip(values) {
            if variable.kind != value.kind() {
                return Err(Error::invalid(format!(
                    "variable `{}` is declared as {:?}, got a {:?} value",
                    variable.name,
                    variable.kind,
                    value.kind()
                )));
            }
        }
        Ok(())
    }

    fn bind_variables(
        &self,
        rasterizer: &mut ContextBoundRasterizer<f32>,
        values: &[VariableValue<'_>],
    ) -> Result<()> {
        for (variable, value) in self.variables.iter().zip(values) {
            match *value {
                // Row-major input, so the driver transposes into column order.
                VariableValue::Matrix { rows, cols, data } => {
                    rasterizer.set_uniform_matrix(&variable.name, cols, rows, true, data)?
                }
                VariableValue::Buffer(data) => {
                    rasterizer.set_shader_storage_buffer(&variable.name, data)?
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RasterizeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterizeOp")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("variables", &self.variables)
            .field("pool", &self.pool)
            .finish()
    }
}
