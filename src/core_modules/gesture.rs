// THEORY:
// The gesture classifier turns one detected hand into a filter selector. It does not
// run a model; it reads the landmarks an external hand-pose model produced and
// applies a fixed decision table.
//
// For each finger the "extension ratio" is the distance from its PIP joint (point 1)
// to its tip (point 3), divided by a reference distance: palm base to middle
// fingertip. Dividing by the reference makes the ratio independent of how far the
// hand is from the camera. A finger counts as extended when its ratio is strictly
// above its threshold.
//
// Thresholds: index 0.23, middle 0.25, ring 0.22. Thumb and pinky have no tuned
// value and fall back to 0.35. The decision table below is calibrated against that
// asymmetry, so the default must stay.
//
//     index only                    -> 1
//     index + middle                -> 2
//     index + middle + ring         -> 3
//     anything else                 -> 0
//
// A hand whose palm base falls inside the exclusion rectangle (the current face
// box) is ignored, since the hand model regularly fires on faces.

use crate::core_modules::detection::{FaceBox, HandAnnotations, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PALM_BASE: &str = "palmBase";
pub const DEFAULT_EXTENSION_THRESHOLD: f64 = 0.35;

const PIP_INDEX: usize = 1;
const TIP_INDEX: usize = 3;

/// The five fingers of a hand, serialized under their annotation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    #[serde(rename = "thumb")]
    Thumb,
    #[serde(rename = "indexFinger")]
    Index,
    #[serde(rename = "middleFinger")]
    Middle,
    #[serde(rename = "ringFinger")]
    Ring,
    #[serde(rename = "pinky")]
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Key of this finger's landmark list in `HandAnnotations`.
    pub fn annotation_key(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "indexFinger",
            Finger::Middle => "middleFinger",
            Finger::Ring => "ringFinger",
            Finger::Pinky => "pinky",
        }
    }
}

/// Which fingers are extended in the current detection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerExtensionState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerExtensionState {
    pub fn is_extended(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    fn set(&mut self, finger: Finger, extended: bool) {
        match finger {
            Finger::Thumb => self.thumb = extended,
            Finger::Index => self.index = extended,
            Finger::Middle => self.middle = extended,
            Finger::Ring => self.ring = extended,
            Finger::Pinky => self.pinky = extended,
        }
    }
}

/// Filter chosen by hand gesture. `None` means no recognised gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureFilter {
    #[default]
    None,
    First,
    Second,
    Third,
}

impl GestureFilter {
    /// Integer selector code, 0 to 3.
    pub fn code(self) -> u8 {
        match self {
            GestureFilter::None => 0,
            GestureFilter::First => 1,
            GestureFilter::Second => 2,
            GestureFilter::Third => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GestureFilter::None),
            1 => Some(GestureFilter::First),
            2 => Some(GestureFilter::Second),
            3 => Some(GestureFilter::Third),
            _ => None,
        }
    }
}

/// Maps hand landmarks to a `GestureFilter` through per-finger extension ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureClassifier {
    /// Tuned thresholds; fingers without an entry use `default_threshold`.
    thresholds: HashMap<Finger, f64>,
    default_threshold: f64,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        let thresholds = HashMap::from([
            (Finger::Index, 0.23),
            (Finger::Middle, 0.25),
            (Finger::Ring, 0.22),
        ]);
        Self {
            thresholds,
            default_threshold: DEFAULT_EXTENSION_THRESHOLD,
        }
    }
}

impl GestureClassifier {
    pub fn with_thresholds(thresholds: HashMap<Finger, f64>, default_threshold: f64) -> Self {
        Self {
            thresholds,
            default_threshold,
        }
    }

    pub fn threshold_for(&self, finger: Finger) -> f64 {
        self.thresholds
            .get(&finger)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    /// Palm base (first `palmBase` point) and middle fingertip, if both are present.
    fn anchors(hand: &HandAnnotations) -> Option<(Point, Point)> {
        let palm_base = hand.point(PALM_BASE, 0)?;
        let middle_tip = hand.point(Finger::Middle.annotation_key(), TIP_INDEX)?;
        Some((palm_base, middle_tip))
    }

    /// Distance from palm base to middle fingertip.
    pub fn reference_distance(hand: &HandAnnotations) -> Option<f64> {
        Self::anchors(hand).map(|(palm_base, middle_tip)| palm_base.distance(&middle_tip))
    }

    /// PIP-to-tip length of `finger` relative to `reference`. `None` when the
    /// finger's landmarks are missing.
    pub fn extension_ratio(hand: &HandAnnotations, finger: Finger, reference: f64) -> Option<f64> {
        let key = finger.annotation_key();
        let pip = hand.point(key, PIP_INDEX)?;
        let tip = hand.point(key, TIP_INDEX)?;
        Some(pip.distance(&tip) / reference)
    }

    /// Extension flags for all five fingers. Missing fingers are not extended.
    pub fn extension_states(&self, hand: &HandAnnotations, reference: f64) -> FingerExtensionState {
        let mut state = FingerExtensionState::default();
        for finger in Finger::ALL {
            let extended = Self::extension_ratio(hand, finger, reference)
                .is_some_and(|ratio| ratio > self.threshold_for(finger));
            state.set(finger, extended);
        }
        state
    }

    /// Applies the decision table to a set of extension flags.
    pub fn decide(state: &FingerExtensionState) -> GestureFilter {
        match (state.index, state.middle, state.ring, state.pinky, state.thumb) {
            (true, false, false, false, false) => GestureFilter::First,
            (true, true, false, false, false) => GestureFilter::Second,
            (true, true, true, false, false) => GestureFilter::Third,
            _ => GestureFilter::None,
        }
    }

    /// Classifies one hand. Returns `GestureFilter::None` for a missing hand, missing
    /// anchor landmarks, a palm base inside `exclusion`, or a degenerate reference.
    pub fn classify(&self, hand: Option<&HandAnnotations>, exclusion: Option<&FaceBox>) -> GestureFilter {
        let Some(hand) = hand else {
            return GestureFilter::None;
        };
        let Some((palm_base, middle_tip)) = Self::anchors(hand) else {
            return GestureFilter::None;
        };
        if exclusion.is_some_and(|face| face.contains(&palm_base)) {
            log::trace!("hand ignored: palm base inside exclusion box");
            return GestureFilter::None;
        }
        let reference = palm_base.distance(&middle_tip);
        if reference <= 0.0 {
            return GestureFilter::None;
        }
        Self::decide(&self.extension_states(hand, reference))
    }
}
