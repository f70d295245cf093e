// THEORY:
// A `PixelBuffer` is the frame as the pipeline sees it: a flat, row-major RGBA raster
// with fixed dimensions. Pixel (x, y) lives at linear index y * width + x, i.e. bytes
// [4i, 4i + 4). Construction is the only place dimensions are checked; once a buffer
// exists its length is exactly width * height * 4 and every operator can rely on it.
//
// Buffers are plain owned values. Operators read a `&PixelBuffer` and return a new
// one, so a caller never sees a buffer it still holds change underneath it. A frame
// is created by the frame source, passed through the transform chain, handed to the
// display and dropped; nothing is cached across frames.

use crate::core_modules::pixel::pixel::{Bytes, CHANNELS, Pixel};
use crate::error::{Result, VisionError};
use image::RgbaImage;

/// A flat RGBA raster with fixed, non-zero width and height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes, rejecting zero dimensions and length mismatches.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = expected_len(width, height);
        if width == 0 || height == 0 || data.len() != expected {
            return Err(VisionError::InvalidBuffer {
                width,
                height,
                len: data.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer filled with a single pixel value.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self> {
        let bytes: Bytes = pixel.into();
        let data = bytes.repeat(width as usize * height as usize);
        Self::from_raw(width, height, data)
    }

    /// Builds a buffer from pixels listed in row-major order.
    pub fn from_pixels(width: u32, height: u32, pixels: &[Pixel]) -> Result<Self> {
        let data = pixels
            .iter()
            .flat_map(|pixel| Bytes::from(*pixel))
            .collect();
        Self::from_raw(width, height, data)
    }

    pub fn from_rgba_image(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length is guaranteed by construction, so this never falls through.
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels (width * height).
    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * CHANNELS)
    }

    /// The pixel at (x, y), or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        let index = self.index_of(x, y)?;
        let bytes: Bytes = self.data[index..index + CHANNELS].try_into().ok()?;
        Some(Pixel::from(bytes))
    }

    /// Overwrites the pixel at (x, y). Returns false when (x, y) is outside the raster.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> bool {
        match self.index_of(x, y) {
            Some(index) => {
                let bytes: Bytes = pixel.into();
                self.data[index..index + CHANNELS].copy_from_slice(&bytes);
                true
            }
            None => false,
        }
    }

    /// Iterates pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.data.chunks_exact(CHANNELS).map(|bytes| {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        })
    }

    /// Copies out the rectangle starting at (x, y). The rectangle must lie entirely
    /// inside the raster and be non-empty.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Option<PixelBuffer> {
        if width == 0 || height == 0 {
            return None;
        }
        let right = x.checked_add(width)?;
        let bottom = y.checked_add(height)?;
        if right > self.width || bottom > self.height {
            return None;
        }

        let row_bytes = width as usize * CHANNELS;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in y..bottom {
            let start = self.index_of(x, row)?;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Some(PixelBuffer {
            width,
            height,
            data,
        })
    }

    /// Copies `source` into this buffer with its top-left corner at (x, y).
    /// Parts of `source` falling outside this raster are dropped.
    pub fn paste(&mut self, source: &PixelBuffer, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let copy_width = source.width.min(self.width - x) as usize;
        let copy_height = source.height.min(self.height - y);
        let row_bytes = copy_width * CHANNELS;

        for row in 0..copy_height {
            let source_start = row as usize * source.width as usize * CHANNELS;
            let target_start = ((y + row) as usize * self.width as usize + x as usize) * CHANNELS;
            self.data[target_start..target_start + row_bytes]
                .copy_from_slice(&source.data[source_start..source_start + row_bytes]);
        }
    }

    /// A horizontally flipped copy, as a front-facing camera preview is shown.
    pub fn mirrored(&self) -> PixelBuffer {
        let row_bytes = self.width as usize * CHANNELS;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_bytes) {
            for pixel in row.chunks_exact(CHANNELS).rev() {
                data.extend_from_slice(pixel);
            }
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> PixelBuffer {
        let pixels: Vec<Pixel> = (0..width * height)
            .map(|i| Pixel::new(i as u8, 0, 0, 255))
            .collect();
        PixelBuffer::from_pixels(width, height, &pixels).expect("valid buffer")
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            PixelBuffer::from_raw(0, 4, Vec::new()),
            Err(VisionError::InvalidBuffer { .. })
        ));
        assert!(PixelBuffer::from_raw(4, 0, Vec::new()).is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        match err {
            VisionError::InvalidBuffer { len, expected, .. } => {
                assert_eq!(len, 15);
                assert_eq!(expected, 16);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn pixels_are_row_major() {
        let buffer = numbered(3, 2);
        assert_eq!(buffer.pixel(0, 0).map(|p| p.red), Some(0));
        assert_eq!(buffer.pixel(2, 0).map(|p| p.red), Some(2));
        assert_eq!(buffer.pixel(0, 1).map(|p| p.red), Some(3));
        assert_eq!(buffer.pixel(3, 0), None);
        assert_eq!(buffer.pixel_count(), 6);
    }

    #[test]
    fn region_copies_sub_rectangle() {
        let buffer = numbered(4, 3);
        let region = buffer.region(1, 1, 2, 2).expect("inside");
        let reds: Vec<u8> = region.pixels().map(|p| p.red).collect();
        assert_eq!(reds, vec![5, 6, 9, 10]);
        assert!(buffer.region(3, 0, 2, 1).is_none());
        assert!(buffer.region(0, 0, 0, 1).is_none());
    }

    #[test]
    fn paste_clips_to_target() {
        let mut target = PixelBuffer::filled(3, 3, Pixel::default()).expect("valid");
        let patch = PixelBuffer::filled(2, 2, Pixel::new(9, 9, 9, 9)).expect("valid");
        target.paste(&patch, 2, 2);
        assert_eq!(target.pixel(2, 2), Some(Pixel::new(9, 9, 9, 9)));
        assert_eq!(target.pixel(1, 1), Some(Pixel::default()));
    }

    #[test]
    fn mirrored_flips_each_row() {
        let buffer = numbered(3, 2);
        let flipped = buffer.mirrored();
        let reds: Vec<u8> = flipped.pixels().map(|p| p.red).collect();
        assert_eq!(reds, vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn rgba_image_round_trip_keeps_bytes() {
        let buffer = numbered(2, 2);
        let image = buffer.to_rgba_image();
        assert_eq!(image.get_pixel(1, 1).0, [3, 0, 0, 255]);
        let back = PixelBuffer::from_rgba_image(image).expect("valid");
        assert_eq!(back, buffer);
    }
}
