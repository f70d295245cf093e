use anyhow::{Context, Result, bail};
use image::{Rgba, RgbaImage, imageops};
use lumen_vision::core_modules::detection::{FaceBox, HandAnnotations, detection_cell};
use lumen_vision::core_modules::pixel_buffer::PixelBuffer;
use lumen_vision::core_modules::source::{CameraProbe, Display, FrameSource, Readiness};
use lumen_vision::core_modules::utils::image_helper::image_helper;
use lumen_vision::{FrameSettings, PipelineConfig, Report, VisionPipeline};
use serde::Deserialize;
use std::env;

/// Everything a run needs besides the input image. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scene {
    pipeline: PipelineConfig,
    settings: FrameSettings,
    face: Option<FaceBox>,
    hand: Option<HandAnnotations>,
}

/// A still image standing in for the camera.
struct StillImage(PixelBuffer);

impl FrameSource for StillImage {
    fn current_frame(&self) -> Option<PixelBuffer> {
        Some(self.0.clone())
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Composes panels onto one RGBA canvas, scaling each into its cell.
struct Canvas(RgbaImage);

impl Canvas {
    fn for_config(config: &PipelineConfig) -> Result<Self> {
        let side = |base: i32, cells: i64, cell: u32, padding: i32| -> Result<u32> {
            let length = 2 * i64::from(base) + cells * i64::from(cell) + (cells - 1) * i64::from(padding);
            u32::try_from(length.max(1)).context("panel grid does not fit in one image")
        };
        let width = side(config.base_x, 3, config.cell_width, config.padding_x)?;
        let height = side(config.base_y, 5, config.cell_height, config.padding_y)?;
        let background = Rgba([24, 24, 24, 255]);
        Ok(Canvas(RgbaImage::from_pixel(width, height, background)))
    }
}

impl Display for Canvas {
    fn render(&mut self, buffer: &PixelBuffer, x: i64, y: i64, width: u32, height: u32) {
        let mut panel = buffer.to_rgba_image();
        if panel.dimensions() != (width, height) {
            panel = imageops::resize(&panel, width, height, imageops::FilterType::Triangle);
        }
        imageops::overlay(&mut self.0, &panel, x, y);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: visual_tester <input_image_path> <output_png_path> [scene.json]");
        return Ok(());
    }
    let input_path = &args[1];
    let output_path = &args[2];
    let scene: Scene = match args.get(3) {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&json).with_context(|| format!("parsing {path}"))?
        }
        None => Scene::default(),
    };

    // --- 2. Frame Source & Detections ---
    let frame = image_helper::load(input_path).with_context(|| format!("loading {input_path}"))?;
    log::info!("loaded {input_path}: {}x{}", frame.width(), frame.height());
    let source = StillImage(frame);
    let mut readiness = Readiness::resolved(CameraProbe::Available);

    let (face_publisher, faces) = detection_cell::<FaceBox>();
    let (hand_publisher, hands) = detection_cell::<HandAnnotations>();
    face_publisher.publish(scene.face);
    hand_publisher.publish(scene.hand);

    // --- 3. Vision Pipeline ---
    let mut pipeline = VisionPipeline::new(scene.pipeline.clone());
    let report = pipeline.tick(&mut readiness, &source, &scene.settings, &faces, &hands);
    let frame_report = match &report {
        Report::Frame(frame_report) => frame_report,
        Report::Checking => bail!("camera probe still pending"),
        Report::NoCamera => bail!("no camera available"),
        Report::NoFrame => bail!("source produced no frame"),
    };
    log::info!(
        "gesture filter {} across {} panels",
        frame_report.gesture.code(),
        frame_report.panels.len()
    );

    // --- 4. Visualization ---
    let mut canvas = Canvas::for_config(pipeline.config())?;
    report.present(&mut canvas);
    let composite = PixelBuffer::from_rgba_image(canvas.0)?;
    image_helper::save(output_path, &composite).with_context(|| format!("writing {output_path}"))?;

    println!("Processing complete. Output saved to {}", output_path);
    Ok(())
}
