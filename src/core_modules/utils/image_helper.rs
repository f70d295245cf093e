pub mod image_helper {
    use crate::core_modules::pixel_buffer::PixelBuffer;
    use crate::error::Result;
    use image::ImageEncoder;
    use std::path::Path;

    /// Writes `buffer` as an RGBA PNG.
    pub fn save(path: impl AsRef<Path>, buffer: &PixelBuffer) -> Result<()> {
        let output = std::io::BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            buffer.as_bytes(),
            buffer.width(),
            buffer.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }

    /// Decodes any image format `image` understands into an RGBA buffer.
    pub fn load(path: impl AsRef<Path>) -> Result<PixelBuffer> {
        let decoded = image::open(path)?.to_rgba8();
        PixelBuffer::from_rgba_image(decoded)
    }
}
