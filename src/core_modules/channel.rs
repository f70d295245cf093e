// THEORY:
// Channel isolation and the raw-channel threshold work directly on the RGB slots of
// a frame, with no colour-space conversion in between.
//
// - `extract_channel` keeps one of red/green/blue and zeroes the other two, so the
//   channel is shown in its own colour.
// - `threshold` turns the kept channel into a hard 0/255 highlight, still in its own
//   slot. This is NOT the white/black binarisation used after HSV or YCbCr
//   conversion (see `color_space::binarize`); the panels that show per-channel
//   thresholds depend on the coloured output, so the two stay separate.
//
// Alpha always passes through.

use crate::core_modules::mapper::map;
use crate::core_modules::pixel::pixel::{Channel, Pixel};
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::UnrecognizedSelector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three colour slots of an RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; 3] = [ColorChannel::Red, ColorChannel::Green, ColorChannel::Blue];

    /// Slot index inside a pixel: 0 red, 1 green, 2 blue.
    pub fn slot(self) -> usize {
        match self {
            ColorChannel::Red => 0,
            ColorChannel::Green => 1,
            ColorChannel::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorChannel::Red => "red",
            ColorChannel::Green => "green",
            ColorChannel::Blue => "blue",
        }
    }

    pub fn value_of(self, pixel: Pixel) -> Channel {
        match self {
            ColorChannel::Red => pixel.red,
            ColorChannel::Green => pixel.green,
            ColorChannel::Blue => pixel.blue,
        }
    }

    /// A pixel holding `value` in this channel's slot, zero in the other two.
    fn isolate(self, value: Channel, alpha: Channel) -> Pixel {
        match self {
            ColorChannel::Red => Pixel::new(value, 0, 0, alpha),
            ColorChannel::Green => Pixel::new(0, value, 0, alpha),
            ColorChannel::Blue => Pixel::new(0, 0, value, alpha),
        }
    }
}

impl fmt::Display for ColorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorChannel {
    type Err = UnrecognizedSelector;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "red" => Ok(ColorChannel::Red),
            "green" => Ok(ColorChannel::Green),
            "blue" => Ok(ColorChannel::Blue),
            other => Err(UnrecognizedSelector(other.to_string())),
        }
    }
}

/// Keeps `channel` and alpha, zeroes the other two channels.
pub fn extract_pixel(pixel: Pixel, channel: ColorChannel) -> Pixel {
    channel.isolate(channel.value_of(pixel), pixel.alpha)
}

/// Single-channel highlight: 255 in `channel`'s slot when its value is strictly
/// above `cutoff`, else 0; the other two channels are 0 and alpha is kept.
pub fn threshold(pixel: Pixel, channel: ColorChannel, cutoff: Channel) -> Pixel {
    let value = if channel.value_of(pixel) > cutoff { 255 } else { 0 };
    channel.isolate(value, pixel.alpha)
}

pub fn extract_channel(buffer: &PixelBuffer, channel: ColorChannel) -> PixelBuffer {
    map(buffer, |pixel| extract_pixel(pixel, channel))
}

pub fn threshold_channel(buffer: &PixelBuffer, channel: ColorChannel, cutoff: Channel) -> PixelBuffer {
    map(buffer, |pixel| threshold(pixel, channel, cutoff))
}

/// Name-based `extract_channel`; unknown names return an unchanged copy.
pub fn extract_channel_named(buffer: &PixelBuffer, name: &str) -> PixelBuffer {
    match name.parse::<ColorChannel>() {
        Ok(channel) => extract_channel(buffer, channel),
        Err(err) => {
            log::debug!("channel extraction skipped: {err}");
            buffer.clone()
        }
    }
}

/// Name-based `threshold_channel`; unknown names return an unchanged copy.
pub fn threshold_channel_named(buffer: &PixelBuffer, name: &str, cutoff: Channel) -> PixelBuffer {
    match name.parse::<ColorChannel>() {
        Ok(channel) => threshold_channel(buffer, channel, cutoff),
        Err(err) => {
            log::debug!("channel threshold skipped: {err}");
            buffer.clone()
        }
    }
}
