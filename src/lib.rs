// THEORY:
// This file is the main entry point for the `lumen_vision` library crate.
// The public surface is the `VisionPipeline` and its data structures
// (`PipelineConfig`, `FrameSettings`, `Report`), which turn one camera frame plus
// the latest face and hand detections into a grid of transformed panels.
//
// The per-pixel operators, the detection cells and the frontend traits live in
// `core_modules` and are public as well, so a frontend can run a single operator
// without the whole grid.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use error::{Result, VisionError};
pub use pipeline::{FrameSettings, PipelineConfig, Report, VisionPipeline};
