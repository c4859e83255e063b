mod common;

use headless_raster::glow::{self, HasContext};
use headless_raster::{
    ContextConfig, ErrorKind, OffscreenContext, PixelElement, RenderTargets, StorageBuffer,
};

use common::init_logging;

fn context() -> OffscreenContext {
    init_logging();
    let context = OffscreenContext::new(&ContextConfig::with_size(8, 8)).unwrap();
    context.make_current().unwrap();
    context
}

fn clear_and_read<T: PixelElement>(width: u32, height: u32, color: [f32; 3]) -> Vec<T> {
    let context = context();
    let gl = context.gl().unwrap();
    let targets = RenderTargets::<T>::new(gl.clone(), width, height).unwrap();

    let mut pixels = vec![T::default(); (width * height * 4) as usize];
    unsafe {
        gl.raw().viewport(0, 0, width as i32, height as i32);
        gl.raw().clear_color(color[0], color[1], color[2], 1.0);
        gl.raw().clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    }
    targets.read_pixels(&mut pixels).unwrap();

    drop(targets);
    context.release().unwrap();
    pixels
}

// ============================================================================
// Pixel Elements (no driver needed)
// ============================================================================

#[test]
fn test_element_formats() {
    assert_eq!(<u8 as PixelElement>::NAME, "u8");
    assert_eq!(<f32 as PixelElement>::NAME, "f32");
    assert_eq!(u8::quantize(0.2), 51);
    assert_eq!(f32::quantize(0.2), 0.2);
}

// ============================================================================
// Render Targets
// ============================================================================

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_create_leaves_frame_buffer_bound() {
    let context = context();
    let gl = context.gl().unwrap();
    let targets = RenderTargets::<f32>::new(gl.clone(), 3, 2).unwrap();
    assert_eq!((targets.width(), targets.height()), (3, 2));

    let status = unsafe { gl.raw().check_framebuffer_status(glow::FRAMEBUFFER) };
    assert_eq!(status, glow::FRAMEBUFFER_COMPLETE);
    let bound = unsafe { gl.raw().get_parameter_i32(glow::FRAMEBUFFER_BINDING) };
    assert_ne!(bound, 0, "the new frame buffer should be bound, not the surface");

    drop(targets);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_zero_size_is_rejected() {
    let context = context();
    let err = RenderTargets::<u8>::new(context.gl().unwrap(), 0, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_read_pixels_checks_buffer_length() {
    let context = context();
    let targets = RenderTargets::<f32>::new(context.gl().unwrap(), 3, 2).unwrap();

    let mut short = vec![0.0f32; 3 * 2 * 4 - 1];
    assert_eq!(targets.read_pixels(&mut short).unwrap_err().kind(), ErrorKind::InvalidArgument);
    let mut long = vec![0.0f32; 3 * 2 * 4 + 4];
    assert_eq!(targets.read_pixels(&mut long).unwrap_err().kind(), ErrorKind::InvalidArgument);

    drop(targets);
    context.release().unwrap();
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_float_targets_keep_exact_clear_values() {
    let pixels = clear_and_read::<f32>(4, 3, [0.1, 0.2, 0.3]);
    for px in pixels.chunks_exact(4) {
        assert_eq!(px, &[0.1, 0.2, 0.3, 1.0]);
    }
}

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_byte_targets_quantize_clear_values() {
    let pixels = clear_and_read::<u8>(4, 3, [0.1, 0.2, 0.3]);
    for px in pixels.chunks_exact(4) {
        for (channel, value) in [0.1f32, 0.2, 0.3, 1.0].into_iter().enumerate() {
            let expected = i32::from(u8::quantize(value));
            assert!((i32::from(px[channel]) - expected).abs() <= 1, "got {px:?}");
        }
    }
}

// ============================================================================
// Storage Buffers
// ============================================================================

#[test]
#[ignore = "requires an EGL-capable GPU driver"]
fn test_upload_resizes_and_unbinds() {
    let context = context();
    let gl = context.gl().unwrap();
    let mut buffer = StorageBuffer::new(gl.clone()).unwrap();

    buffer.upload(&[1.0f32, 2.0, 3.0]).unwrap();
    assert_eq!(buffer.len_bytes(), 12);
    buffer.upload(&[7u32; 16]).unwrap();
    assert_eq!(buffer.len_bytes(), 64);
    buffer.upload::<f32>(&[]).unwrap();
    assert_eq!(buffer.len_bytes(), 0);

    let bound = unsafe { gl.raw().get_parameter_i32(glow::SHADER_STORAGE_BUFFER_BINDING) };
    assert_eq!(bound, 0, "generic binding point should be cleared after upload");

    buffer.bind_base(0).unwrap();
    drop(buffer);
    context.release().unwrap();
}
