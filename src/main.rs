// This file is an example of how to use the `lumen_vision` library.
// The library entry point is `src/lib.rs`; `visual_tester` runs the pipeline on
// real images.

use lumen_vision::core_modules::pixel::pixel::Pixel;
use lumen_vision::core_modules::pixel_buffer::PixelBuffer;
use lumen_vision::{FrameSettings, PipelineConfig, VisionPipeline};

fn main() -> lumen_vision::Result<()> {
    env_logger::init();
    println!("Lumen Vision Engine - Example Runner");

    let config = PipelineConfig::default();
    let pipeline = VisionPipeline::new(config.clone());
    let frame = PixelBuffer::filled(config.cell_width, config.cell_height, Pixel::new(200, 120, 40, 255))?;
    let report = pipeline.process(&frame, &FrameSettings::default(), None, None);

    for panel in &report.panels {
        let centre = panel.buffer.pixel(panel.buffer.width() / 2, panel.buffer.height() / 2);
        println!("{:?} at ({}, {}): {:?}", panel.kind, panel.x, panel.y, centre);
    }
    Ok(())
}
