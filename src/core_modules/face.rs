// THEORY:
// Face modification rewrites only the detected face region of a frame. The region is
// cut out, transformed, and pasted back at the same place; the rest of the frame is
// copied through untouched.
//
// Modification codes (as the keyboard sends them):
//   1 greyscale, 2 gaussian blur, 3 HSV encoding, 4 pixelate (greyscale, then
//   downscale by a 5 px block and scale back up with nearest sampling)
//
// The detector reports boxes in floating point and can overhang the frame edge, so
// the box is rounded and clipped first. No face, a box entirely outside the frame,
// or an unknown code all leave the frame as it was.

use crate::core_modules::color_space::{greyscale, to_hsv};
use crate::core_modules::detection::FaceBox;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::UnrecognizedSelector;
use image::imageops::{self, FilterType};
use std::str::FromStr;

pub const BLUR_SIGMA: f32 = 10.0;
pub const PIXEL_BLOCK_SIZE: u32 = 5;

/// How the face region is altered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceModification {
    Greyscale,
    Blur,
    Hsv,
    Pixelate,
}

impl FromStr for FaceModification {
    type Err = UnrecognizedSelector;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "1" => Ok(FaceModification::Greyscale),
            "2" => Ok(FaceModification::Blur),
            "3" => Ok(FaceModification::Hsv),
            "4" => Ok(FaceModification::Pixelate),
            other => Err(UnrecognizedSelector(other.to_string())),
        }
    }
}

/// Integer rectangle (x, y, width, height) of `face` clipped to the frame.
pub fn clip_to_frame(face: &FaceBox, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let left = face.x.round().max(0.0);
    let top = face.y.round().max(0.0);
    let right = (face.x + face.w).round().min(width as f64);
    let bottom = (face.y + face.h).round().min(height as f64);
    if !(right > left && bottom > top) {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

fn pixelate(region: &PixelBuffer) -> PixelBuffer {
    let grey = greyscale(region).to_rgba_image();
    let (width, height) = grey.dimensions();
    let small_width = (width / PIXEL_BLOCK_SIZE).max(1);
    let small_height = (height / PIXEL_BLOCK_SIZE).max(1);
    let small = imageops::resize(&grey, small_width, small_height, FilterType::Nearest);
    let restored = imageops::resize(&small, width, height, FilterType::Nearest);
    PixelBuffer::from_rgba_image(restored).unwrap_or_else(|_| region.clone())
}

fn blur(region: &PixelBuffer) -> PixelBuffer {
    let blurred = imageops::blur(&region.to_rgba_image(), BLUR_SIGMA);
    PixelBuffer::from_rgba_image(blurred).unwrap_or_else(|_| region.clone())
}

/// Applies `modification` to a whole buffer.
pub fn modify(region: &PixelBuffer, modification: FaceModification) -> PixelBuffer {
    match modification {
        FaceModification::Greyscale => greyscale(region),
        FaceModification::Blur => blur(region),
        FaceModification::Hsv => to_hsv(region),
        FaceModification::Pixelate => pixelate(region),
    }
}

/// Returns a copy of `frame` with the face region modified. Missing face or
/// modification, or a face outside the frame, yields an unchanged copy.
pub fn apply_to_face(
    frame: &PixelBuffer,
    face: Option<&FaceBox>,
    modification: Option<FaceModification>,
) -> PixelBuffer {
    let (Some(face), Some(modification)) = (face, modification) else {
        return frame.clone();
    };
    let Some((x, y, width, height)) = clip_to_frame(face, frame.width(), frame.height()) else {
        return frame.clone();
    };
    let Some(region) = frame.region(x, y, width, height) else {
        return frame.clone();
    };

    let mut output = frame.clone();
    output.paste(&modify(&region, modification), x, y);
    output
}

/// Code-based `apply_to_face`; unknown codes leave the frame unchanged.
pub fn apply_to_face_code(frame: &PixelBuffer, face: Option<&FaceBox>, code: &str) -> PixelBuffer {
    let modification = match code.parse::<FaceModification>() {
        Ok(modification) => Some(modification),
        Err(err) => {
            log::debug!("face modification skipped: {err}");
            None
        }
    };
    apply_to_face(frame, face, modification)
}
