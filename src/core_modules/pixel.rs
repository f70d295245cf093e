// THEORY:
// The `Pixel` module is the most fundamental unit of the transform pipeline. It is a
// "dumb" data container for a single RGBA pixel plus a small set of single-pixel
// heuristics: metrics that can be computed from this pixel alone, with no knowledge
// of neighbours, position or the rest of the frame.
//
// Every operator in the pipeline (greyscale, HSV, YCbCr, channel isolation,
// thresholding) is expressed as a function from one `Pixel` to another. Keeping
// the pixel small and `Copy` means those functions can take and return it by value
// in the hot loop without allocation.
//
// Heuristic families (all single-pixel, all in f64 on the 0..255 or 0..1 scale):
// - Brightness: luma (Rec. 601 weights), HSV value (max channel)
// - Colour strength: chroma (max - min), HSV saturation (chroma / value)
// - Hue: angle on the colour wheel in degrees [0, 360)
//
// Computed components that may leave [0, 255] are brought back with
// `clamp_channel`, which rounds to the nearest integer like a clamped byte canvas.

pub mod pixel {
    pub type Byte = u8;
    pub type Bytes = [Byte; CHANNELS];
    pub type Channel = Byte;
    pub type Luminance = f64;
    pub type Hue = f64;
    pub type SaturationHSV = f64;
    pub type ValueHSV = f64;
    pub type Chroma = f64;

    pub const CHANNELS: usize = 4;

    /// Rec. 601 luma weights. Blue is 0.114; 0.0114 is a known transcription error.
    pub const LUMA_RED: f64 = 0.299;
    pub const LUMA_GREEN: f64 = 0.587;
    pub const LUMA_BLUE: f64 = 0.114;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// A pixel with all three colour channels set to `value`.
        pub const fn grey(value: Channel, alpha: Channel) -> Self {
            Pixel::new(value, value, value, alpha)
        }

        /// Colour channels in slot order (red, green, blue).
        pub fn rgb(&self) -> [Channel; 3] {
            [self.red, self.green, self.blue]
        }

        /// Channel value by slot index: 0 red, 1 green, 2 blue, 3 alpha.
        pub fn slot(&self, index: usize) -> Option<Channel> {
            match index {
                0 => Some(self.red),
                1 => Some(self.green),
                2 => Some(self.blue),
                3 => Some(self.alpha),
                _ => None,
            }
        }

        /// =================================Heuristics==================================

        /// Luminance estimate (Rec. 601 luma) on the 0..255 scale.
        pub fn luminance(&self) -> Luminance {
            LUMA_RED * self.red as f64 + LUMA_GREEN * self.green as f64 + LUMA_BLUE * self.blue as f64
        }

        fn normalized(&self) -> (f64, f64, f64) {
            (
                self.red as f64 / 255.0,
                self.green as f64 / 255.0,
                self.blue as f64 / 255.0,
            )
        }

        /// HSV Value (V): max(R, G, B) on the 0..1 scale.
        pub fn value_hsv(&self) -> ValueHSV {
            let (r, g, b) = self.normalized();
            r.max(g.max(b))
        }

        /// Chroma (C): max(R,G,B) - min(R,G,B) on the 0..1 scale.
        pub fn chroma(&self) -> Chroma {
            let (r, g, b) = self.normalized();
            r.max(g.max(b)) - r.min(g.min(b))
        }

        /// Saturation (HSV): chroma / value, 0 for black.
        pub fn saturation_hsv(&self) -> SaturationHSV {
            let maximum_channel = self.value_hsv();
            if maximum_channel == 0.0 {
                return 0.0;
            }
            self.chroma() / maximum_channel
        }

        /// Hue angle in degrees [0, 360). Achromatic pixels (chroma 0) have hue 0.
        pub fn hue(&self) -> Hue {
            let (r, g, b) = self.normalized();
            let maximum_channel = r.max(g.max(b));
            let chroma = self.chroma();

            if chroma == 0.0 {
                return 0.0;
            }

            let (base_difference, sector_offset) = if maximum_channel == r {
                (g - b, 0.0)
            } else if maximum_channel == g {
                (b - r, 2.0)
            } else {
                (r - g, 4.0)
            };

            let mut hue_degrees = (base_difference / chroma + sector_offset) * 60.0;
            if hue_degrees < 0.0 {
                hue_degrees += 360.0;
            }
            hue_degrees
        }
    }

    /// Rounds a computed component to the nearest integer and clamps it into [0, 255].
    #[inline]
    pub fn clamp_channel(value: f64) -> Channel {
        if value.is_nan() {
            return 0;
        }
        value.round().clamp(0.0, 255.0) as Channel
    }

    impl From<Bytes> for Pixel {
        fn from(bytes: Bytes) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }

    impl From<image::Rgba<u8>> for Pixel {
        fn from(rgba: image::Rgba<u8>) -> Self {
            Pixel::from(rgba.0)
        }
    }

    impl From<Pixel> for image::Rgba<u8> {
        fn from(pixel: Pixel) -> Self {
            image::Rgba(pixel.into())
        }
    }
}
