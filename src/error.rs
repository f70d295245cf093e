use thiserror::Error;

/// Errors surfaced by the transform pipeline.
///
/// Missing detections and unknown selector names are deliberately absent: the
/// operators that receive them pass their input through unchanged.
#[derive(Debug, Error)]
pub enum VisionError {
    /// A raw frame whose dimensions are zero or disagree with its byte length.
    #[error("invalid pixel buffer: {width}x{height} with {len} bytes (expected {expected})")]
    InvalidBuffer {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VisionError>;

/// A selector name (channel, colour component, modification code) that the
/// pipeline does not know. Operators fed one return their input unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized selector `{0}`")]
pub struct UnrecognizedSelector(pub String);
