// THEORY:
// Colour-space conversion for display. Each converter is a pure pixel transform run
// through the mapper, and each writes its three components into the (r, g, b) slots
// so the result can be shown like any other frame:
//
// - greyscale: Rec. 601 luma, brightened by 20% and capped at 255
// - HSV:       (h / 360 * 255, s * 255, v * 255)
// - YCbCr:     BT.601 (Y, Cb, Cr) with the usual +128 chroma offset
//
// These encodings are one-way visualisations. Scaling hue into a byte and rounding
// every component loses precision, so converting back will not reproduce the input.
//
// `binarize` is the threshold used after a conversion: a chosen component strictly
// above the cutoff gives pure white, otherwise pure black. Alpha passes through
// every operator in this module.

use crate::core_modules::channel::ColorChannel;
use crate::core_modules::mapper::map;
use crate::core_modules::pixel::pixel::{
    Channel, LUMA_BLUE, LUMA_GREEN, LUMA_RED, Pixel, clamp_channel,
};
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::UnrecognizedSelector;
use serde::{Deserialize, Serialize};

/// Brightness gain applied after the luma sum.
pub const GREYSCALE_GAIN: f64 = 1.2;

const WHITE: Channel = 255;
const BLACK: Channel = 0;

/// A colour space a frame can be encoded in for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    Rgb,
    Hsv,
    YCbCr,
}

/// A single component of an encoded frame, addressed by its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorComponent {
    Channel(ColorChannel),
    Hue,
    Saturation,
    Value,
    Luma,
    BlueDifference,
    RedDifference,
}

impl ColorComponent {
    /// Slot the component occupies once the frame is encoded.
    pub fn slot(self) -> usize {
        match self {
            ColorComponent::Channel(channel) => channel.slot(),
            ColorComponent::Hue | ColorComponent::Luma => 0,
            ColorComponent::Saturation | ColorComponent::BlueDifference => 1,
            ColorComponent::Value | ColorComponent::RedDifference => 2,
        }
    }

    pub fn value_of(self, pixel: Pixel) -> Channel {
        pixel.rgb()[self.slot()]
    }
}

impl ColorSpace {
    /// Parses a component name as the UI spells it (`H`, `S`, `V`, `Y`, `Cb`, `Cr`,
    /// `red`, `green`, `blue`). Names from another space are rejected.
    pub fn component(self, name: &str) -> Result<ColorComponent, UnrecognizedSelector> {
        let component = match (self, name) {
            (ColorSpace::Hsv, "H") => ColorComponent::Hue,
            (ColorSpace::Hsv, "S") => ColorComponent::Saturation,
            (ColorSpace::Hsv, "V") => ColorComponent::Value,
            (ColorSpace::YCbCr, "Y") => ColorComponent::Luma,
            (ColorSpace::YCbCr, "Cb") => ColorComponent::BlueDifference,
            (ColorSpace::YCbCr, "Cr") => ColorComponent::RedDifference,
            (ColorSpace::Rgb, other) => ColorComponent::Channel(other.parse()?),
            (_, other) => return Err(UnrecognizedSelector(other.to_string())),
        };
        Ok(component)
    }

    /// Encodes a frame into this space.
    pub fn convert(self, buffer: &PixelBuffer) -> PixelBuffer {
        match self {
            ColorSpace::Rgb => buffer.clone(),
            ColorSpace::Hsv => to_hsv(buffer),
            ColorSpace::YCbCr => to_ycbcr(buffer),
        }
    }
}

/// =================================Pixel transforms==================================

pub fn greyscale_pixel(pixel: Pixel) -> Pixel {
    let bright = (pixel.luminance() * GREYSCALE_GAIN).min(255.0);
    Pixel::grey(clamp_channel(bright), pixel.alpha)
}

pub fn hsv_pixel(pixel: Pixel) -> Pixel {
    let hue = pixel.hue() / 360.0 * 255.0;
    let saturation = pixel.saturation_hsv() * 255.0;
    let value = pixel.value_hsv() * 255.0;
    Pixel::new(
        clamp_channel(hue),
        clamp_channel(saturation),
        clamp_channel(value),
        pixel.alpha,
    )
}

pub fn ycbcr_pixel(pixel: Pixel) -> Pixel {
    let (r, g, b) = (pixel.red as f64, pixel.green as f64, pixel.blue as f64);
    let luma = LUMA_RED * r + LUMA_GREEN * g + LUMA_BLUE * b;
    let blue_difference = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0;
    let red_difference = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0;
    Pixel::new(
        clamp_channel(luma),
        clamp_channel(blue_difference),
        clamp_channel(red_difference),
        pixel.alpha,
    )
}

/// White when `component` is strictly above `cutoff`, black otherwise.
pub fn binarize_pixel(pixel: Pixel, component: ColorComponent, cutoff: Channel) -> Pixel {
    if component.value_of(pixel) > cutoff {
        Pixel::grey(WHITE, pixel.alpha)
    } else {
        Pixel::grey(BLACK, pixel.alpha)
    }
}

/// =================================Buffer operators==================================

pub fn greyscale(buffer: &PixelBuffer) -> PixelBuffer {
    map(buffer, greyscale_pixel)
}

pub fn to_hsv(buffer: &PixelBuffer) -> PixelBuffer {
    map(buffer, hsv_pixel)
}

pub fn to_ycbcr(buffer: &PixelBuffer) -> PixelBuffer {
    map(buffer, ycbcr_pixel)
}

/// Binarizes an already encoded frame on one of its components.
pub fn binarize(buffer: &PixelBuffer, component: ColorComponent, cutoff: Channel) -> PixelBuffer {
    map(buffer, |pixel| binarize_pixel(pixel, component, cutoff))
}

/// Binarizes `buffer` (already encoded in `space`) on the component called `name`.
/// An unknown name leaves the frame as it was.
pub fn binarize_named(
    buffer: &PixelBuffer,
    space: ColorSpace,
    name: &str,
    cutoff: Channel,
) -> PixelBuffer {
    match space.component(name) {
        Ok(component) => binarize(buffer, component, cutoff),
        Err(err) => {
            log::debug!("{space:?} threshold skipped: {err}");
            buffer.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greyscale_scenario_from_two_pixel_frame() {
        let input = PixelBuffer::from_pixels(
            2,
            1,
            &[Pixel::new(200, 100, 50, 255), Pixel::new(10, 10, 10, 0)],
        )
        .expect("valid");
        let output = greyscale(&input);
        // 200 * 0.299 + 100 * 0.587 + 50 * 0.114 = 124.2, * 1.2 = 149.04
        assert_eq!(output.pixel(0, 0), Some(Pixel::grey(149, 255)));
        assert_eq!(output.pixel(1, 0), Some(Pixel::grey(12, 0)));
    }

    #[test]
    fn greyscale_of_grey_is_brightened_and_capped() {
        for value in 0..=255u8 {
            let output = greyscale_pixel(Pixel::grey(value, 33));
            let expected = clamp_channel((value as f64 * 1.2).min(255.0));
            assert_eq!(output, Pixel::grey(expected, 33));
        }
    }

    #[test]
    fn hsv_of_achromatic_is_value_only() {
        for value in [0u8, 1, 100, 254, 255] {
            assert_eq!(hsv_pixel(Pixel::grey(value, 5)), Pixel::new(0, 0, value, 5));
        }
    }

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(hsv_pixel(Pixel::new(255, 0, 0, 255)), Pixel::new(0, 255, 255, 255));
        // 120 / 360 * 255 = 85
        assert_eq!(hsv_pixel(Pixel::new(0, 255, 0, 255)), Pixel::new(85, 255, 255, 255));
        // 240 / 360 * 255 = 170
        assert_eq!(hsv_pixel(Pixel::new(0, 0, 128, 9)), Pixel::new(170, 255, 128, 9));
    }

    #[test]
    fn ycbcr_matches_bt601() {
        assert_eq!(ycbcr_pixel(Pixel::new(0, 0, 0, 1)), Pixel::new(0, 128, 128, 1));
        assert_eq!(ycbcr_pixel(Pixel::new(255, 255, 255, 1)), Pixel::new(255, 128, 128, 1));
        // Pure blue pushes Cb to its ceiling: 0.5 * 255 + 128 = 255.5.
        let blue = ycbcr_pixel(Pixel::new(0, 0, 255, 1));
        assert_eq!(blue.green, 255);
        assert_eq!(blue.red, 29);
    }

    #[test]
    fn conversions_stay_in_range_and_keep_alpha() {
        // Channels are bytes, so range is enforced by the type; check alpha and a
        // coarse sweep for panics in the clamping path.
        for r in (0..=255u16).step_by(51) {
            for g in (0..=255u16).step_by(51) {
                for b in (0..=255u16).step_by(51) {
                    let pixel = Pixel::new(r as u8, g as u8, b as u8, 77);
                    assert_eq!(hsv_pixel(pixel).alpha, 77);
                    assert_eq!(ycbcr_pixel(pixel).alpha, 77);
                }
            }
        }
    }

    #[test]
    fn binarize_outputs_white_or_black() {
        let pixel = Pixel::new(10, 200, 128, 3);
        assert_eq!(binarize_pixel(pixel, ColorComponent::Saturation, 199), Pixel::grey(255, 3));
        assert_eq!(binarize_pixel(pixel, ColorComponent::Saturation, 200), Pixel::grey(0, 3));
        assert_eq!(binarize_pixel(pixel, ColorComponent::RedDifference, 127), Pixel::grey(255, 3));
        assert_eq!(
            binarize_pixel(pixel, ColorComponent::Channel(ColorChannel::Red), 10),
            Pixel::grey(0, 3)
        );
    }

    #[test]
    fn component_names_are_scoped_to_their_space() {
        assert_eq!(ColorSpace::Hsv.component("V"), Ok(ColorComponent::Value));
        assert_eq!(ColorSpace::YCbCr.component("Cb"), Ok(ColorComponent::BlueDifference));
        assert_eq!(
            ColorSpace::Rgb.component("blue"),
            Ok(ColorComponent::Channel(ColorChannel::Blue))
        );
        assert!(ColorSpace::Hsv.component("Y").is_err());
        assert!(ColorSpace::YCbCr.component("cb").is_err());
    }

    #[test]
    fn binarize_named_passes_unknown_through() {
        let input = PixelBuffer::filled(2, 2, Pixel::new(40, 50, 60, 70)).expect("valid");
        assert_eq!(binarize_named(&input, ColorSpace::Hsv, "Q", 10), input);
        let output = binarize_named(&input, ColorSpace::YCbCr, "Y", 10);
        assert!(output.pixels().all(|p| p == Pixel::grey(255, 70)));
    }
}
