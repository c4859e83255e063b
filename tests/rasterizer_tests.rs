mod common;

use headless_raster::glow::{self, HasContext};
use headless_raster::{
    ContextConfig, Error, ErrorKind, OffscreenContext, Rasterizer, RasterizerConfig,
};

use common::{
    covering_triangle, empty_config, init_logging, mesh_config, BROKEN_SHADER, EMPTY_SHADER,
    POINT_GEOMETRY_SHADER, VIEW_PROJECTION,
};

fn context() -> OffscreenContext {
    init_logging();
    let context = OffscreenContext::new(&ContextConfig::with_size(8, 8)).unwrap();
    context.make_current().unwrap();
    context
}

// ============================================================================
// Creation
// ============================================================================

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_create() {
    let context = context();
    let rasterizer = Rasterizer::<f32>::new(context.gl().unwrap(), &empty_config(3, 2)).unwrap();
    assert_eq!((rasterizer.width(), rasterizer.height()), (3, 2));
    assert_eq!(rasterizer.clear_values().depth, 1.0);
    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_create_fails_on_broken_shader() {
    let context = context();
    let config = RasterizerConfig::new(3, 2, EMPTY_SHADER, POINT_GEOMETRY_SHADER, BROKEN_SHADER);
    let err = Rasterizer::<u8>::new(context.gl().unwrap(), &config).unwrap_err();
    assert!(matches!(err, Error::Compile { .. }), "got {err}");
    context.release().unwrap();
}

// ============================================================================
// Variables
// ============================================================================

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_set_shader_storage_buffer_with_unused_name() {
    let context = context();
    let mut rasterizer =
        Rasterizer::<f32>::new(context.gl().unwrap(), &empty_config(3, 2)).unwrap();

    // Fronto-parallel triangle at depth 1.
    let geometry = [-1.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, -1.0, 1.0];
    rasterizer.set_shader_storage_buffer("geometry", &geometry).unwrap();
    rasterizer.set_shader_storage_buffer("geometry", &geometry[..6]).unwrap();

    let mut pixels = vec![0.0f32; 3 * 2 * 4];
    rasterizer.render(0, &mut pixels).unwrap();

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_set_uniform_matrix() {
    let context = context();
    let mut rasterizer = Rasterizer::<f32>::new(context.gl().unwrap(), &mesh_config(3, 2)).unwrap();

    rasterizer
        .set_uniform_matrix("view_projection_matrix", 4, 4, false, &[0.0; 16])
        .unwrap();
    rasterizer
        .set_uniform_mat4("view_projection_matrix", glam::Mat4::IDENTITY)
        .unwrap();

    let gl = context.gl().unwrap();
    let current = unsafe { gl.raw().get_parameter_i32(glow::CURRENT_PROGRAM) };
    assert_eq!(current, 0, "setter must leave no program installed");

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_set_uniform_matrix_errors() {
    let context = context();
    let mut rasterizer = Rasterizer::<f32>::new(context.gl().unwrap(), &mesh_config(3, 2)).unwrap();

    let wrong_len =
        rasterizer.set_uniform_matrix("view_projection_matrix", 4, 4, false, &[0.0; 15]);
    assert_eq!(wrong_len.unwrap_err().kind(), ErrorKind::InvalidArgument);

    let wrong_shape =
        rasterizer.set_uniform_matrix("view_projection_matrix", 2, 8, false, &[0.0; 16]);
    assert_eq!(wrong_shape.unwrap_err().kind(), ErrorKind::InvalidArgument);

    let missing = rasterizer.set_uniform_matrix("model_matrix", 4, 4, false, &[0.0; 16]);
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_set_uniform_matrix_rejects_non_matrix_uniform() {
    const VEC_GEOMETRY: &str = r#"#version 430
uniform vec4 tint;
layout(points) in;
layout(points, max_vertices=1) out;
out layout(location = 0) vec4 color;
void main() {
  color = tint;
  gl_Position = vec4(0.0, 0.0, 0.0, 1.0);
  EmitVertex();
  EndPrimitive();
}
"#;
    const VEC_FRAGMENT: &str = r#"#version 430
in layout(location = 0) vec4 color;
out vec4 output_color;
void main() { output_color = color; }
"#;

    let context = context();
    let config = RasterizerConfig::new(2, 2, EMPTY_SHADER, VEC_GEOMETRY, VEC_FRAGMENT);
    let mut rasterizer = Rasterizer::<f32>::new(context.gl().unwrap(), &config).unwrap();

    let err = rasterizer.set_uniform_matrix("tint", 2, 2, false, &[0.0; 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    drop(rasterizer);
    context.release().unwrap();
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_render_without_points_yields_clear_values() {
    let context = context();
    let config = empty_config(5, 4).with_clear_color(0.1, 0.2, 0.3);
    let mut rasterizer = Rasterizer::<f32>::new(context.gl().unwrap(), &config).unwrap();

    let mut pixels = vec![0.0f32; 5 * 4 * 4];
    rasterizer.render(0, &mut pixels).unwrap();
    for px in pixels.chunks_exact(4) {
        assert_eq!(px, &[0.1, 0.2, 0.3, 1.0]);
    }

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_render_rejects_wrong_buffer_length() {
    let context = context();
    let mut rasterizer = Rasterizer::<u8>::new(context.gl().unwrap(), &empty_config(3, 3)).unwrap();

    let mut pixels = vec![0u8; 3 * 3 * 3];
    let err = rasterizer.render(0, &mut pixels).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_render_triangle_at_increasing_depths() {
    const WIDTH: u32 = 3;
    const HEIGHT: u32 = 3;

    let context = context();
    let mut rasterizer =
        Rasterizer::<f32>::new(context.gl().unwrap(), &mesh_config(WIDTH, HEIGHT)).unwrap();
    rasterizer
        .set_uniform_matrix("view_projection_matrix", 4, 4, false, &VIEW_PROJECTION)
        .unwrap();

    let mut pixels = vec![0.0f32; (WIDTH * HEIGHT * 4) as usize];
    for depth in [2.0f32, 3.0, 4.0] {
        rasterizer
            .set_shader_storage_buffer("triangular_mesh", &covering_triangle(depth))
            .unwrap();
        rasterizer.render(1, &mut pixels).unwrap();

        for (i, px) in pixels.chunks_exact(4).enumerate() {
            assert_eq!(px[2], 0.0, "pixel {i}: triangle id");
            assert_eq!(px[3], depth, "pixel {i}: depth");
        }
    }

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_render_leaves_no_program_installed() {
    let context = context();
    let gl = context.gl().unwrap();
    let mut rasterizer = Rasterizer::<f32>::new(gl.clone(), &mesh_config(2, 2)).unwrap();

    let mut pixels = vec![0.0f32; 2 * 2 * 4];
    rasterizer.render(0, &mut pixels).unwrap();
    assert_eq!(unsafe { gl.raw().get_parameter_i32(glow::CURRENT_PROGRAM) }, 0);

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_failed_draw_uninstalls_program() {
    // Drawing points into a stage that expects triangles is rejected by the
    // draw call itself, after the program has been installed.
    const TRIANGLE_GEOMETRY: &str = r#"#version 430
layout(triangles) in;
layout(points, max_vertices=1) out;
void main() { }
"#;

    let context = context();
    let gl = context.gl().unwrap();
    let config = RasterizerConfig::new(2, 2, EMPTY_SHADER, TRIANGLE_GEOMETRY, EMPTY_SHADER);
    let mut rasterizer = Rasterizer::<f32>::new(gl.clone(), &config).unwrap();

    let mut pixels = vec![0.0f32; 2 * 2 * 4];
    let err = rasterizer.render(3, &mut pixels).unwrap_err();
    assert!(matches!(err, Error::Gl { call: "glDrawArrays", .. }), "got {err}");
    assert_eq!(err.kind(), ErrorKind::Native);
    assert_eq!(unsafe { gl.raw().get_parameter_i32(glow::CURRENT_PROGRAM) }, 0);

    drop(rasterizer);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_stale_error_is_not_blamed_on_next_call() {
    let context = context();
    let gl = context.gl().unwrap();
    let mut rasterizer = Rasterizer::<f32>::new(gl.clone(), &mesh_config(2, 2)).unwrap();

    // An unchecked call through the raw table leaves GL_INVALID_ENUM pending.
    unsafe { gl.raw().enable(0xFFFF) };

    rasterizer.set_shader_storage_buffer("triangular_mesh", &covering_triangle(3.0)).unwrap();
    let mut pixels = vec![0.0f32; 2 * 2 * 4];
    rasterizer.render(0, &mut pixels).unwrap();
    assert_eq!(unsafe { gl.raw().get_error() }, glow::NO_ERROR);

    drop(rasterizer);
    context.release().unwrap();
}
