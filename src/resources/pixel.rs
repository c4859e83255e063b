use bytemuck::Pod;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for f32 {}
}

/// Element type of a color render target and of its read-back buffer.
///
/// Implemented for `u8` (normalized RGBA8) and `f32` (RGBA32F) only.
pub trait PixelElement: Pod + Default + PartialEq + std::fmt::Debug + sealed::Sealed {
    /// Internal format of the color render buffer.
    const INTERNAL_FORMAT: u32;
    /// Transfer type used by `glReadPixels`.
    const TRANSFER_TYPE: u32;
    const NAME: &'static str;

    /// Value a render target of this type stores for a color component `v`
    /// written by a shader or a clear.
    fn quantize(v: f32) -> Self;
}

impl PixelElement for u8 {
    const INTERNAL_FORMAT: u32 = glow::RGBA8;
    const TRANSFER_TYPE: u32 = glow::UNSIGNED_BYTE;
    const NAME: &'static str = "u8";

    fn quantize(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl PixelElement for f32 {
    const INTERNAL_FORMAT: u32 = glow::RGBA32F;
    const TRANSFER_TYPE: u32 = glow::FLOAT;
    const NAME: &'static str = "f32";

    fn quantize(v: f32) -> Self {
        v
    }
}
