// THEORY:
// The boundaries between the transform core and the outside world. Camera access,
// rendering and permission probing are not implemented here; they are described as
// small traits so any frontend (a browser bridge, a native camera, a still image on
// disk) can plug in.
//
// - `FrameSource` hands out the current frame on demand.
// - `Display` receives a processed frame and the rectangle to draw it in.
// - `Readiness` wraps the one-shot result of probing for a camera. The frame loop
//   asks for its status every frame; the question never blocks, it only reports
//   Checking until the probe has answered.

use crate::core_modules::pixel_buffer::PixelBuffer;
use tokio::sync::oneshot;

/// Supplies camera frames to the pipeline.
pub trait FrameSource {
    /// A snapshot of the current frame, or `None` when no frame is available yet.
    fn current_frame(&self) -> Option<PixelBuffer>;

    /// Whether a live camera backs this source.
    fn is_live(&self) -> bool;
}

/// Renders processed frames.
pub trait Display {
    fn render(&mut self, buffer: &PixelBuffer, x: i64, y: i64, width: u32, height: u32);
}

/// Result of probing for a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraProbe {
    Available,
    /// No camera, permission denied, or the platform lacks media devices.
    Unavailable(String),
}

/// What the frame loop should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessStatus {
    Checking,
    Ready,
    NoCamera,
}

/// Non-blocking view of a one-shot camera probe.
#[derive(Debug)]
pub struct Readiness {
    pending: Option<oneshot::Receiver<CameraProbe>>,
    resolved: Option<ReadinessStatus>,
}

impl Readiness {
    /// Creates the sender the probing code resolves, and the readiness view.
    pub fn channel() -> (oneshot::Sender<CameraProbe>, Readiness) {
        let (sender, receiver) = oneshot::channel();
        (
            sender,
            Readiness {
                pending: Some(receiver),
                resolved: None,
            },
        )
    }

    /// Readiness that is already settled, for sources that need no probe.
    pub fn resolved(probe: CameraProbe) -> Readiness {
        Readiness {
            pending: None,
            resolved: Some(Self::status_for(probe)),
        }
    }

    fn status_for(probe: CameraProbe) -> ReadinessStatus {
        match probe {
            CameraProbe::Available => ReadinessStatus::Ready,
            CameraProbe::Unavailable(reason) => {
                log::error!("no camera: {reason}");
                ReadinessStatus::NoCamera
            }
        }
    }

    /// Current status. Once the probe has answered the answer is kept.
    pub fn status(&mut self) -> ReadinessStatus {
        if let Some(status) = &self.resolved {
            return status.clone();
        }
        let Some(receiver) = self.pending.as_mut() else {
            return ReadinessStatus::NoCamera;
        };
        let status = match receiver.try_recv() {
            Ok(probe) => Self::status_for(probe),
            Err(oneshot::error::TryRecvError::Empty) => return ReadinessStatus::Checking,
            Err(oneshot::error::TryRecvError::Closed) => {
                log::error!("camera probe dropped without an answer");
                ReadinessStatus::NoCamera
            }
        };
        self.pending = None;
        self.resolved = Some(status.clone());
        status
    }
}
