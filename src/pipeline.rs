// THEORY:
// The `pipeline` module is the top-level API of the engine. It runs every operator
// once per display tick and lays the results out for a display, so a frontend only
// needs to supply a frame, the current UI values and the latest detection snapshots.
//
// Everything that used to be global UI state (slider positions, selected components,
// the active face modification, the snapshot toggle) arrives as a `FrameSettings`
// value read fresh each frame. Besides its configuration the pipeline keeps exactly
// one piece of state: the frozen snapshot frame while `show_snapshot` is set.
//
// Panel grid (column, row):
//
//              col 0                col 1            col 2
//     row 0    original             greyscale        gesture filter
//     row 1    red channel          green channel    blue channel
//     row 2    red threshold        green threshold  blue threshold
//     row 3    original             HSV              YCbCr
//     row 4    face modification    HSV threshold    YCbCr threshold

use crate::core_modules::channel::{ColorChannel, extract_channel, threshold_channel};
use crate::core_modules::color_space::{ColorSpace, binarize_named, greyscale, to_hsv, to_ycbcr};
use crate::core_modules::detection::{DetectionSnapshot, FaceBox, HandAnnotations};
use crate::core_modules::face::apply_to_face_code;
use crate::core_modules::grid_layout::{GridCell, GridLayout};
use crate::core_modules::pixel::pixel::Channel;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::source::{Display, FrameSource, Readiness, ReadinessStatus};
use crate::error::Result;
use serde::{Deserialize, Serialize};

// Re-export key data structures for the public API.
pub use crate::core_modules::gesture::{GestureClassifier, GestureFilter};

/// Configuration for the VisionPipeline, fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Width of one grid cell, normally the camera preview width.
    pub cell_width: u32,
    /// Height of one grid cell, normally the camera preview height.
    pub cell_height: u32,
    pub base_x: i32,
    pub base_y: i32,
    pub padding_x: i32,
    pub padding_y: i32,
    /// Show panels horizontally flipped, like a mirror.
    pub mirror: bool,
    pub gesture: GestureClassifier,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cell_width: 160,
            cell_height: 120,
            base_x: 10,
            base_y: 10,
            padding_x: 10,
            padding_y: 30,
            mirror: true,
            gesture: GestureClassifier::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout::new(
            self.base_x,
            self.base_y,
            self.cell_width,
            self.cell_height,
            self.padding_x,
            self.padding_y,
        )
    }
}

/// UI values read once per frame. They may change between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub red_threshold: Channel,
    pub green_threshold: Channel,
    pub blue_threshold: Channel,
    pub hsv_threshold: Channel,
    pub ycbcr_threshold: Channel,
    /// `H`, `S` or `V`.
    pub hsv_component: String,
    /// `Y`, `Cb` or `Cr`.
    pub ycbcr_component: String,
    /// Face modification code `1`..`4`; `None` shows the face untouched.
    pub face_modification: Option<String>,
    /// Process a frozen snapshot instead of the live frame.
    pub show_snapshot: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            red_threshold: 128,
            green_threshold: 128,
            blue_threshold: 128,
            hsv_threshold: 128,
            ycbcr_threshold: 128,
            hsv_component: "H".to_string(),
            ycbcr_component: "Y".to_string(),
            face_modification: None,
            show_snapshot: false,
        }
    }
}

/// What a panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Original,
    Greyscale,
    GestureFilter,
    Channel(ColorChannel),
    ChannelThreshold(ColorChannel),
    OriginalRepeat,
    Hsv,
    YCbCr,
    FaceModification,
    HsvThreshold,
    YCbCrThreshold,
}

impl PanelKind {
    pub fn cell(self) -> GridCell {
        match self {
            PanelKind::Original => GridCell::new(0, 0),
            PanelKind::Greyscale => GridCell::new(1, 0),
            PanelKind::GestureFilter => GridCell::new(2, 0),
            PanelKind::Channel(channel) => GridCell::new(channel.slot() as i32, 1),
            PanelKind::ChannelThreshold(channel) => GridCell::new(channel.slot() as i32, 2),
            PanelKind::OriginalRepeat => GridCell::new(0, 3),
            PanelKind::Hsv => GridCell::new(1, 3),
            PanelKind::YCbCr => GridCell::new(2, 3),
            PanelKind::FaceModification => GridCell::new(0, 4),
            PanelKind::HsvThreshold => GridCell::new(1, 4),
            PanelKind::YCbCrThreshold => GridCell::new(2, 4),
        }
    }
}

/// One processed frame placed on the display.
#[derive(Debug, Clone)]
pub struct Panel {
    pub kind: PanelKind,
    pub buffer: PixelBuffer,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// All panels produced from one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// The gesture filter active for this frame.
    pub gesture: GestureFilter,
    pub panels: Vec<Panel>,
}

impl FrameReport {
    pub fn panel(&self, kind: PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.kind == kind)
    }
}

/// The primary output of the vision pipeline for a single tick.
#[derive(Debug, Clone)]
pub enum Report {
    /// The camera probe has not answered yet.
    Checking,
    /// No camera is available; nothing will be produced.
    NoCamera,
    /// The camera is ready but has not delivered a frame yet.
    NoFrame,
    Frame(FrameReport),
}

impl Report {
    /// Hands every panel to `display`. Status variants render nothing.
    pub fn present<D: Display + ?Sized>(&self, display: &mut D) {
        if let Report::Frame(frame) = self {
            for panel in &frame.panels {
                display.render(&panel.buffer, panel.x, panel.y, panel.width, panel.height);
            }
        }
    }
}

/// The main, top-level struct for the transform engine.
pub struct VisionPipeline {
    config: PipelineConfig,
    layout: GridLayout,
    snapshot: Option<PixelBuffer>,
}

impl VisionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            snapshot: None,
        }
    }

    /// The frozen frame, if one has been taken.
    pub fn snapshot(&self) -> Option<&PixelBuffer> {
        self.snapshot.as_ref()
    }

    /// Freezes `frame` as the snapshot, replacing any earlier one.
    pub fn take_snapshot(&mut self, frame: PixelBuffer) {
        self.snapshot = Some(frame);
    }

    pub fn clear_snapshot(&mut self) {
        self.snapshot = None;
    }

    /// Live frame, or the snapshot while `show_snapshot` is set. The first
    /// snapshot tick freezes the current live frame.
    fn select_frame<S: FrameSource + ?Sized>(
        &mut self,
        source: &S,
        settings: &FrameSettings,
    ) -> Option<PixelBuffer> {
        if !settings.show_snapshot {
            self.snapshot = None;
            return source.current_frame();
        }
        if self.snapshot.is_none() {
            let frame = source.current_frame()?;
            log::debug!("snapshot taken: {}x{}", frame.width(), frame.height());
            self.snapshot = Some(frame);
        }
        self.snapshot.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Applies the filter chosen by gesture to `frame`.
    pub fn apply_gesture_filter(frame: &PixelBuffer, filter: GestureFilter) -> PixelBuffer {
        match filter {
            GestureFilter::None => frame.clone(),
            GestureFilter::First => greyscale(frame),
            GestureFilter::Second => to_hsv(frame),
            GestureFilter::Third => to_ycbcr(frame),
        }
    }

    fn panel(&self, kind: PanelKind, buffer: PixelBuffer) -> Panel {
        let (x, y) = self.layout.cell_position(kind.cell());
        let buffer = if self.config.mirror {
            buffer.mirrored()
        } else {
            buffer
        };
        Panel {
            kind,
            buffer,
            x,
            y,
            width: self.config.cell_width,
            height: self.config.cell_height,
        }
    }

    /// Runs every operator on one frame.
    pub fn process(
        &self,
        frame: &PixelBuffer,
        settings: &FrameSettings,
        face: Option<&FaceBox>,
        hand: Option<&HandAnnotations>,
    ) -> FrameReport {
        // Stage 1: gesture selection, with the face box excluded from hand matches.
        let gesture = self.config.gesture.classify(hand, face);

        // Stage 2: colour operators.
        let hsv = to_hsv(frame);
        let ycbcr = to_ycbcr(frame);
        let mut panels = vec![
            self.panel(PanelKind::Original, frame.clone()),
            self.panel(PanelKind::Greyscale, greyscale(frame)),
            self.panel(PanelKind::GestureFilter, Self::apply_gesture_filter(frame, gesture)),
        ];

        // Stage 3: raw channels and their thresholds.
        let cutoffs = [
            (ColorChannel::Red, settings.red_threshold),
            (ColorChannel::Green, settings.green_threshold),
            (ColorChannel::Blue, settings.blue_threshold),
        ];
        for (channel, cutoff) in cutoffs {
            panels.push(self.panel(PanelKind::Channel(channel), extract_channel(frame, channel)));
            panels.push(self.panel(
                PanelKind::ChannelThreshold(channel),
                threshold_channel(frame, channel, cutoff),
            ));
        }

        // Stage 4: colour spaces, face region and component thresholds.
        let face_frame = match settings.face_modification.as_deref() {
            Some(code) => apply_to_face_code(frame, face, code),
            None => frame.clone(),
        };
        let hsv_threshold = binarize_named(
            &hsv,
            ColorSpace::Hsv,
            &settings.hsv_component,
            settings.hsv_threshold,
        );
        let ycbcr_threshold = binarize_named(
            &ycbcr,
            ColorSpace::YCbCr,
            &settings.ycbcr_component,
            settings.ycbcr_threshold,
        );
        panels.extend([
            self.panel(PanelKind::OriginalRepeat, frame.clone()),
            self.panel(PanelKind::Hsv, hsv),
            self.panel(PanelKind::YCbCr, ycbcr),
            self.panel(PanelKind::FaceModification, face_frame),
            self.panel(PanelKind::HsvThreshold, hsv_threshold),
            self.panel(PanelKind::YCbCrThreshold, ycbcr_threshold),
        ]);

        FrameReport { gesture, panels }
    }

    /// One display tick: checks readiness, pulls the current frame (or snapshot)
    /// and the latest detections, and processes them. Never waits on the probe or
    /// the detectors.
    pub fn tick<S: FrameSource + ?Sized>(
        &mut self,
        readiness: &mut Readiness,
        source: &S,
        settings: &FrameSettings,
        faces: &DetectionSnapshot<FaceBox>,
        hands: &DetectionSnapshot<HandAnnotations>,
    ) -> Report {
        match readiness.status() {
            ReadinessStatus::Checking => return Report::Checking,
            ReadinessStatus::NoCamera => return Report::NoCamera,
            ReadinessStatus::Ready => {}
        }
        let Some(frame) = self.select_frame(source, settings) else {
            return Report::NoFrame;
        };
        let face = faces.latest();
        let hand = hands.latest();
        Report::Frame(self.process(&frame, settings, face.as_ref(), hand.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::detection::{Point, detection_cell};
    use crate::core_modules::gesture::PALM_BASE;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::source::CameraProbe;

    fn frame() -> PixelBuffer {
        let pixels: Vec<Pixel> = (0..12u32)
            .map(|i| Pixel::new((i * 20) as u8, 200, 40, 255))
            .collect();
        PixelBuffer::from_pixels(4, 3, &pixels).expect("valid")
    }

    fn unmirrored() -> VisionPipeline {
        VisionPipeline::new(PipelineConfig {
            mirror: false,
            ..PipelineConfig::default()
        })
    }

    fn index_pointing_hand() -> HandAnnotations {
        HandAnnotations::new()
            .with(PALM_BASE, vec![Point::new(0.0, 0.0)])
            .with(
                "middleFinger",
                vec![
                    Point::new(0.0, 80.0),
                    Point::new(0.0, 90.0),
                    Point::new(0.0, 95.0),
                    Point::new(0.0, 100.0),
                ],
            )
            .with(
                "indexFinger",
                vec![
                    Point::new(20.0, 40.0),
                    Point::new(20.0, 50.0),
                    Point::new(20.0, 65.0),
                    Point::new(20.0, 80.0),
                ],
            )
    }

    struct Recorder(Vec<(i64, i64, u32, u32)>);

    impl Display for Recorder {
        fn render(&mut self, _buffer: &PixelBuffer, x: i64, y: i64, width: u32, height: u32) {
            self.0.push((x, y, width, height));
        }
    }

    struct Camera(Option<PixelBuffer>);

    impl FrameSource for Camera {
        fn current_frame(&self) -> Option<PixelBuffer> {
            self.0.clone()
        }

        fn is_live(&self) -> bool {
            self.0.is_some()
        }
    }

    #[test]
    fn produces_every_panel_at_its_cell() {
        let pipeline = unmirrored();
        let report = pipeline.process(&frame(), &FrameSettings::default(), None, None);
        assert_eq!(report.panels.len(), 15);

        let greyscale_panel = report.panel(PanelKind::Greyscale).expect("present");
        assert_eq!((greyscale_panel.x, greyscale_panel.y), (180, 10));
        let blue_threshold = report
            .panel(PanelKind::ChannelThreshold(ColorChannel::Blue))
            .expect("present");
        assert_eq!((blue_threshold.x, blue_threshold.y), (350, 310));
        assert_eq!((blue_threshold.width, blue_threshold.height), (160, 120));
        let face = report.panel(PanelKind::FaceModification).expect("present");
        assert_eq!((face.x, face.y), (10, 610));
    }

    #[test]
    fn panels_hold_the_matching_operator_output() {
        let pipeline = unmirrored();
        let input = frame();
        let report = pipeline.process(&input, &FrameSettings::default(), None, None);
        let red = report.panel(PanelKind::Channel(ColorChannel::Red)).expect("present");
        assert_eq!(red.buffer, extract_channel(&input, ColorChannel::Red));
        let hsv = report.panel(PanelKind::Hsv).expect("present");
        assert_eq!(hsv.buffer, to_hsv(&input));
        let original = report.panel(PanelKind::Original).expect("present");
        assert_eq!(original.buffer, input);
    }

    #[test]
    fn gesture_drives_the_filter_panel() {
        let pipeline = unmirrored();
        let input = frame();
        let hand = index_pointing_hand();
        let report = pipeline.process(&input, &FrameSettings::default(), None, Some(&hand));
        assert_eq!(report.gesture, GestureFilter::First);
        let filtered = report.panel(PanelKind::GestureFilter).expect("present");
        assert_eq!(filtered.buffer, greyscale(&input));

        let face = FaceBox::new(-1.0, -1.0, 2.0, 2.0);
        let report = pipeline.process(&input, &FrameSettings::default(), Some(&face), Some(&hand));
        assert_eq!(report.gesture, GestureFilter::None);
    }

    #[test]
    fn unknown_component_leaves_encoded_frame() {
        let pipeline = unmirrored();
        let input = frame();
        let settings = FrameSettings {
            hsv_component: "X".into(),
            ..FrameSettings::default()
        };
        let report = pipeline.process(&input, &settings, None, None);
        let panel = report.panel(PanelKind::HsvThreshold).expect("present");
        assert_eq!(panel.buffer, to_hsv(&input));
    }

    #[test]
    fn mirroring_flips_panels() {
        let pipeline = VisionPipeline::new(PipelineConfig::default());
        let input = frame();
        let report = pipeline.process(&input, &FrameSettings::default(), None, None);
        let original = report.panel(PanelKind::Original).expect("present");
        assert_eq!(original.buffer, input.mirrored());
    }

    #[test]
    fn tick_reports_readiness_before_frames() {
        let mut pipeline = unmirrored();
        let (_faces_publisher, faces) = detection_cell::<FaceBox>();
        let (hands_publisher, hands) = detection_cell::<HandAnnotations>();
        let settings = FrameSettings::default();

        let (probe, mut readiness) = Readiness::channel();
        let camera = Camera(Some(frame()));
        assert!(matches!(
            pipeline.tick(&mut readiness, &camera, &settings, &faces, &hands),
            Report::Checking
        ));
        probe.send(CameraProbe::Available).expect("receiver alive");

        assert!(matches!(
            pipeline.tick(&mut readiness, &Camera(None), &settings, &faces, &hands),
            Report::NoFrame
        ));

        hands_publisher.publish(Some(index_pointing_hand()));
        match pipeline.tick(&mut readiness, &camera, &settings, &faces, &hands) {
            Report::Frame(report) => assert_eq!(report.gesture, GestureFilter::First),
            other => panic!("unexpected report {other:?}"),
        }

        let mut no_camera = Readiness::resolved(CameraProbe::Unavailable("none".into()));
        assert!(matches!(
            pipeline.tick(&mut no_camera, &camera, &settings, &faces, &hands),
            Report::NoCamera
        ));
    }

    #[test]
    fn snapshot_freezes_the_first_frame() {
        let mut pipeline = unmirrored();
        let (_faces_publisher, faces) = detection_cell::<FaceBox>();
        let (_hands_publisher, hands) = detection_cell::<HandAnnotations>();
        let mut readiness = Readiness::resolved(CameraProbe::Available);
        let first = frame();
        let second = PixelBuffer::filled(4, 3, Pixel::new(1, 2, 3, 255)).expect("valid");
        let frozen = FrameSettings {
            show_snapshot: true,
            ..FrameSettings::default()
        };

        pipeline.tick(&mut readiness, &Camera(Some(first.clone())), &frozen, &faces, &hands);
        match pipeline.tick(&mut readiness, &Camera(Some(second.clone())), &frozen, &faces, &hands) {
            Report::Frame(report) => {
                let original = report.panel(PanelKind::Original).expect("present");
                assert_eq!(original.buffer, first);
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(pipeline.snapshot(), Some(&first));

        let live = FrameSettings::default();
        match pipeline.tick(&mut readiness, &Camera(Some(second.clone())), &live, &faces, &hands) {
            Report::Frame(report) => {
                let original = report.panel(PanelKind::Original).expect("present");
                assert_eq!(original.buffer, second);
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(pipeline.snapshot(), None);
    }

    #[test]
    fn present_renders_each_panel() {
        let pipeline = unmirrored();
        let report = Report::Frame(pipeline.process(&frame(), &FrameSettings::default(), None, None));
        let mut recorder = Recorder(Vec::new());
        report.present(&mut recorder);
        assert_eq!(recorder.0.len(), 15);
        assert!(recorder.0.contains(&(10, 10, 160, 120)));

        let mut idle = Recorder(Vec::new());
        Report::Checking.present(&mut idle);
        assert!(idle.0.is_empty());
    }

    #[test]
    fn config_reads_partial_json() {
        let config = PipelineConfig::from_json(r#"{"cell_width":320,"mirror":false}"#).expect("valid");
        assert_eq!(config.cell_width, 320);
        assert_eq!(config.cell_height, 120);
        assert!(!config.mirror);
        assert_eq!(config.layout().position(1, 1), (340, 160));

        let wide = PipelineConfig::from_json(r#"{"cell_width":3000000000}"#).expect("valid");
        assert_eq!(wide.layout().cell_width(), 3_000_000_000);
        assert_eq!(wide.layout().position(1, 0), (3_000_000_020, 10));
        assert!(PipelineConfig::from_json("{").is_err());
    }
}
