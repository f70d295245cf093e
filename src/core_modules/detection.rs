// THEORY:
// Detection results arrive from external models (face, hand) at their own cadence,
// independent of the frame loop. Instead of a callback that re-arms itself on every
// result, each detector publishes into a single-slot cell: a new result overwrites
// the old one, and the frame loop reads whatever is there, once per frame, without
// waiting.
//
// - `detection_cell` builds a (publisher, snapshot) pair over `tokio::sync::watch`,
//   which is exactly a one-value, overwrite-on-write channel.
// - `DetectionSnapshot::latest` is a synchronous read. `None` means "nothing
//   detected this frame" and is never an error.
// - `spawn_detection_loop` drives a `Detector` on a tokio task at a fixed period.
//   Stopping it means no further detection is scheduled; there is no in-flight
//   callback to cancel. The loop also ends on its own once every snapshot reader
//   has been dropped.
//
// The result types for the two detectors also live here: `FaceBox` for faces and
// `HandAnnotations` (named landmark lists) for hands.

use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::source::FrameSource;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A 2D landmark position in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Bounding box of a detected face, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FaceBox {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Inclusive containment test on all four edges.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.x + self.w && point.y >= self.y && point.y <= self.y + self.h
    }
}

/// Landmarks of one detected hand, keyed by annotation name (`palmBase`,
/// `thumb`, `indexFinger`, `middleFinger`, `ringFinger`, `pinky`). Each finger
/// lists its points from knuckle to tip. Annotations keep the order they were
/// inserted in (for JSON, document order).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandAnnotations {
    annotations: Vec<(String, Vec<Point>)>,
}

impl HandAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an annotation. Replacing an existing name keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, points: Vec<Point>) {
        let name = name.into();
        match self.annotations.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = points,
            None => self.annotations.push((name, points)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, points: Vec<Point>) -> Self {
        self.insert(name, points);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[Point]> {
        self.annotations
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, points)| points.as_slice())
    }

    /// Annotation names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.annotations.iter().map(|(name, _)| name.as_str())
    }

    /// The `index`-th point of annotation `name`, if present.
    pub fn point(&self, name: &str, index: usize) -> Option<Point> {
        self.get(name)?.get(index).copied()
    }

    /// Every annotated point once, in insertion order, first occurrence kept.
    pub fn keypoints(&self) -> Vec<Point> {
        let mut seen = HashSet::new();
        self.annotations
            .iter()
            .flat_map(|(_, points)| points)
            .filter(|point| seen.insert((point.x.to_bits(), point.y.to_bits())))
            .copied()
            .collect()
    }
}

impl Serialize for HandAnnotations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.annotations.len()))?;
        for (name, points) in &self.annotations {
            map.serialize_entry(name, points)?;
        }
        map.end()
    }
}

struct HandAnnotationsVisitor;

impl<'de> Visitor<'de> for HandAnnotationsVisitor {
    type Value = HandAnnotations;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from annotation name to a list of points")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut hand = HandAnnotations::new();
        while let Some((name, points)) = access.next_entry::<String, Vec<Point>>()? {
            hand.insert(name, points);
        }
        Ok(hand)
    }
}

impl<'de> Deserialize<'de> for HandAnnotations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HandAnnotationsVisitor)
    }
}

/// Writing half of a single-slot detection cell.
#[derive(Debug)]
pub struct DetectionPublisher<T> {
    sender: watch::Sender<Option<T>>,
}

/// Reading half of a single-slot detection cell. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DetectionSnapshot<T> {
    receiver: watch::Receiver<Option<T>>,
}

/// Creates an empty single-slot cell.
pub fn detection_cell<T>() -> (DetectionPublisher<T>, DetectionSnapshot<T>) {
    let (sender, receiver) = watch::channel(None);
    (DetectionPublisher { sender }, DetectionSnapshot { receiver })
}

impl<T> DetectionPublisher<T> {
    /// Replaces whatever the cell holds. `None` clears it.
    pub fn publish(&self, result: Option<T>) {
        // send_replace never fails, even with no readers left.
        self.sender.send_replace(result);
    }

    /// True once every snapshot reader is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn subscribe(&self) -> DetectionSnapshot<T> {
        DetectionSnapshot {
            receiver: self.sender.subscribe(),
        }
    }
}

impl<T: Clone> DetectionSnapshot<T> {
    /// The most recently published result, without waiting.
    pub fn latest(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }
}

/// An external model producing one result per analysed frame.
pub trait Detector: Send + 'static {
    type Output: Send + Sync + 'static;

    /// Runs detection on `frame`. `None` means nothing was found.
    fn detect(&mut self, frame: &PixelBuffer) -> Option<Self::Output>;
}

/// Handle to a running detection loop.
pub struct DetectionTask {
    handle: JoinHandle<()>,
}

impl DetectionTask {
    /// Stops scheduling further detections.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loop to wind down after `stop` or after its readers dropped.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            if !err.is_cancelled() {
                log::warn!("detection loop ended abnormally: {err}");
            }
        }
    }
}

/// Runs `detector` against the source's current frame every `period`, publishing
/// each result into `publisher`. Must be called from within a tokio runtime.
pub fn spawn_detection_loop<D, S>(
    mut detector: D,
    source: Arc<S>,
    publisher: DetectionPublisher<D::Output>,
    period: Duration,
) -> DetectionTask
where
    D: Detector,
    S: FrameSource + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        while !publisher.is_closed() {
            ticker.tick().await;
            let Some(frame) = source.current_frame() else {
                publisher.publish(None);
                continue;
            };
            publisher.publish(detector.detect(&frame));
        }
        log::debug!("detection loop stopped: no readers left");
    });
    DetectionTask { handle }
}
