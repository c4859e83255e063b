//! Shared fixtures for the integration tests.
//!
//! Tests that need a driver are ignored by default. On a machine without a
//! display server run them against Mesa's surfaceless platform:
//!
//! ```text
//! EGL_PLATFORM=surfaceless cargo test -- --ignored
//! ```
#![allow(dead_code)]

use headless_raster::RasterizerConfig;

pub const GPU_REQUIRED: &str = "requires an EGL-capable GPU driver";

pub const EMPTY_SHADER: &str = "#version 430\nvoid main() { }\n";

pub const BROKEN_SHADER: &str = "#version 430\nvoid main() { syntax_error }\n";

/// Smallest geometry stage that links: consumes points, emits nothing.
pub const POINT_GEOMETRY_SHADER: &str = r#"#version 430
layout(points) in;
layout(points, max_vertices=1) out;
void main() { }
"#;

/// Writes barycentric coordinates, triangle id and the object-space depth.
pub const FRAGMENT_SHADER: &str = r#"#version 420

in layout(location = 0) vec3 position;
in layout(location = 1) vec3 normal;
in layout(location = 2) vec2 bar_coord;
in layout(location = 3) float tri_id;

out vec4 output_color;

void main() {
  output_color = vec4(bar_coord, tri_id, position.z);
}
"#;

/// Expands point `i` into triangle `i` of the `triangular_mesh` buffer.
pub const GEOMETRY_SHADER: &str = r#"#version 430

uniform mat4 view_projection_matrix;

layout(points) in;
layout(triangle_strip, max_vertices=3) out;

out layout(location = 0) vec3 position;
out layout(location = 1) vec3 normal;
out layout(location = 2) vec2 bar_coord;
out layout(location = 3) float tri_id;

layout(binding=0) buffer triangular_mesh { float mesh_buffer[]; };

vec3 get_vertex_position(int i) {
  int o = gl_PrimitiveIDIn * 9 + i * 3;
  return vec3(mesh_buffer[o + 0], mesh_buffer[o + 1], mesh_buffer[o + 2]);
}

bool is_back_facing(vec3 v0, vec3 v1, vec3 v2) {
  vec4 tv0 = view_projection_matrix * vec4(v0, 1.0);
  vec4 tv1 = view_projection_matrix * vec4(v1, 1.0);
  vec4 tv2 = view_projection_matrix * vec4(v2, 1.0);
  tv0 /= tv0.w;
  tv1 /= tv1.w;
  tv2 /= tv2.w;
  vec2 a = (tv1.xy - tv0.xy);
  vec2 b = (tv2.xy - tv0.xy);
  return (a.x * b.y - b.x * a.y) <= 0;
}

void main() {
  vec3 v0 = get_vertex_position(0);
  vec3 v1 = get_vertex_position(1);
  vec3 v2 = get_vertex_position(2);

  if (is_back_facing(v0, v1, v2)) {
    return;
  }

  normal = normalize(cross(v1 - v0, v2 - v0));

  vec3 positions[3] = {v0, v1, v2};
  for (int i = 0; i < 3; ++i) {
    gl_Position = view_projection_matrix * vec4(positions[i], 1);
    bar_coord = vec2(i==0 ? 1 : 0, i==1 ? 1 : 0);
    tri_id = gl_PrimitiveIDIn;

    position = positions[i];
    EmitVertex();
  }
  EndPrimitive();
}
"#;

/// Perspective camera at the origin looking down +z, column-major.
pub const VIEW_PROJECTION: [f32; 16] = [
    -1.73205, 0.0, 0.0, 0.0, //
    0.0, 1.73205, 0.0, 0.0, //
    0.0, 0.0, 1.22222, 1.0, //
    0.0, 0.0, -2.22222, 0.0,
];

/// A fronto-parallel triangle at depth `depth` covering the whole viewport.
pub fn covering_triangle(depth: f32) -> [f32; 9] {
    [-10.0, 10.0, depth, 10.0, 10.0, depth, 0.0, -10.0, depth]
}

pub fn empty_config(width: u32, height: u32) -> RasterizerConfig {
    RasterizerConfig::new(width, height, EMPTY_SHADER, POINT_GEOMETRY_SHADER, EMPTY_SHADER)
}

pub fn mesh_config(width: u32, height: u32) -> RasterizerConfig {
    RasterizerConfig::new(width, height, EMPTY_SHADER, GEOMETRY_SHADER, FRAGMENT_SHADER)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
