// THEORY:
// The mapper is the one loop in the pipeline. Every colour operator is a pure
// `Fn(Pixel) -> Pixel` and is applied here, pixel by pixel, in row-major order.
// Because transforms see nothing but their own pixel, the order never affects the
// result; it is fixed anyway so output is reproducible byte for byte.
//
// `map` copies then maps, which is what every public operator uses. `map_in_place`
// exists for code that owns a buffer outright (for example a freshly cropped face
// region) and wants to avoid the extra allocation.

use crate::core_modules::pixel::pixel::{Bytes, CHANNELS, Pixel};
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::Result;

/// A pure per-pixel transform. Blanket-implemented for every matching closure.
pub trait PixelTransform: Fn(Pixel) -> Pixel {}

impl<F> PixelTransform for F where F: Fn(Pixel) -> Pixel {}

/// Applies `transform` to every pixel of `buffer`, returning a new buffer of the
/// same dimensions. The input is left untouched.
pub fn map<F: PixelTransform>(buffer: &PixelBuffer, transform: F) -> PixelBuffer {
    let mut output = buffer.clone();
    map_in_place(&mut output, transform);
    output
}

/// Applies `transform` to every pixel of `buffer` in place.
pub fn map_in_place<F: PixelTransform>(buffer: &mut PixelBuffer, transform: F) {
    for bytes in buffer.as_bytes_mut().chunks_exact_mut(CHANNELS) {
        let pixel = Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let mapped: Bytes = transform(pixel).into();
        bytes.copy_from_slice(&mapped);
    }
}

/// Maps a raw RGBA frame straight from a frame source. Fails with
/// `VisionError::InvalidBuffer` when the dimensions are zero or disagree with the
/// byte length.
pub fn map_frame<F: PixelTransform>(
    width: u32,
    height: u32,
    frame: &[u8],
    transform: F,
) -> Result<PixelBuffer> {
    let mut buffer = PixelBuffer::from_raw(width, height, frame.to_vec())?;
    map_in_place(&mut buffer, transform);
    Ok(buffer)
}
