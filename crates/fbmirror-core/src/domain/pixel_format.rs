//! Pixel layout descriptions for the hardware surface and the remote buffer.
//!
//! The hardware framebuffer reports, for each colour channel, the bit offset
//! of the channel inside a pixel word and the number of bits it occupies
//! (the `red`/`green`/`blue` bitfields of `fb_var_screeninfo`).  The remote
//! side always receives a fixed layout: three 5-bit samples packed
//! red-low / green-mid / blue-high into the low 15 bits of the pixel.
//!
//! # Channel extraction (for beginners)
//!
//! Transcoding one channel is a shift followed by a mask:
//!
//! ```text
//! sample = (pixel >> shift) & 0b1_1111
//! shift  = channel.offset + channel.length - 5
//! ```
//!
//! The shift is chosen so that the *most significant* five bits of the
//! channel land in bits 0..=4.  A 6-bit green channel therefore loses its
//! lowest bit, and a channel narrower than five bits is scaled up with a
//! left shift instead.
//!
//! | Source (RGB565)   | offset | length | shift |
//! |-------------------|--------|--------|-------|
//! | red               | 11     | 5      | 11    |
//! | green             | 5      | 6      | 6     |
//! | blue              | 0      | 5      | 0     |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bits per sample in the remote pixel format.
pub const BITS_PER_SAMPLE: u32 = 5;

/// Mask covering one remote sample.
pub const SAMPLE_MASK: u32 = (1 << BITS_PER_SAMPLE) - 1;

/// Errors raised while describing or selecting a pixel format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The depth/rotation combination has no transcoding strategy.
    #[error("unsupported pixel format: {bits_per_pixel} bpp with rotation {rotation}°")]
    Unsupported {
        bits_per_pixel: u32,
        rotation: u32,
    },

    /// Rotation must be one of 0, 90, 180 or 270 degrees.
    #[error("invalid rotation: {0}° (expected 0, 90, 180 or 270)")]
    InvalidRotation(u32),

    /// A buffer handed to the differ does not match the configured geometry.
    #[error("buffer length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The surface reports a zero width or height.
    #[error("empty surface geometry: {width}x{height}")]
    EmptyGeometry { width: u32, height: u32 },
}

/// Position and width of one colour channel inside a hardware pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLayout {
    /// Bit offset of the channel's least significant bit.
    pub offset: u32,
    /// Number of bits the channel occupies.
    pub length: u32,
}

impl ChannelLayout {
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Signed shift that moves the channel's top five bits to bit 0.
    ///
    /// Negative values mean the channel is narrower than a sample and has to
    /// be shifted left.
    pub fn sample_shift(&self) -> i32 {
        (self.offset + self.length) as i32 - BITS_PER_SAMPLE as i32
    }
}

/// Display rotation applied between the hardware surface and the remote view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Parses a rotation in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidRotation`] for anything other than
    /// 0, 90, 180 or 270.
    pub fn from_degrees(degrees: u32) -> Result<Self, FormatError> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Cw90),
            180 => Ok(Self::Cw180),
            270 => Ok(Self::Cw270),
            other => Err(FormatError::InvalidRotation(other)),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    /// Returns `true` when the rotation swaps width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Cw90 | Self::Cw270)
    }

    /// Maps a source pixel coordinate to its rotated destination.
    ///
    /// `width` and `height` are the extents of the *source* surface.
    pub fn map(self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::None => (x, y),
            Self::Cw90 => (height - 1 - y, x),
            Self::Cw180 => (width - 1 - x, height - 1 - y),
            Self::Cw270 => (y, width - 1 - x),
        }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = FormatError;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Static description of the hardware pixel layout and how it maps to the
/// remote format.
///
/// Built once from the framebuffer geometry; the channel shifts are
/// precomputed so the per-pixel path is three shifts and three masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub bits_per_pixel: u32,
    pub red: ChannelLayout,
    pub green: ChannelLayout,
    pub blue: ChannelLayout,
    red_shift: i32,
    green_shift: i32,
    blue_shift: i32,
}

impl PixelFormatDescriptor {
    pub fn new(
        bits_per_pixel: u32,
        red: ChannelLayout,
        green: ChannelLayout,
        blue: ChannelLayout,
    ) -> Self {
        Self {
            bits_per_pixel,
            red,
            green,
            blue,
            red_shift: red.sample_shift(),
            green_shift: green.sample_shift(),
            blue_shift: blue.sample_shift(),
        }
    }

    /// The common 16-bit RGB565 layout.
    pub fn rgb565() -> Self {
        Self::new(
            16,
            ChannelLayout::new(11, 5),
            ChannelLayout::new(5, 6),
            ChannelLayout::new(0, 5),
        )
    }

    /// 24-bit packed RGB888 (blue in the lowest byte).
    pub fn rgb888() -> Self {
        Self::new(
            24,
            ChannelLayout::new(16, 8),
            ChannelLayout::new(8, 8),
            ChannelLayout::new(0, 8),
        )
    }

    /// 32-bit XRGB8888.
    pub fn xrgb8888() -> Self {
        Self::new(
            32,
            ChannelLayout::new(16, 8),
            ChannelLayout::new(8, 8),
            ChannelLayout::new(0, 8),
        )
    }

    /// 1-bit monochrome; channel layout is irrelevant.
    pub fn mono() -> Self {
        Self::new(1, ChannelLayout::default(), ChannelLayout::default(), ChannelLayout::default())
    }

    /// 8-bit pseudo-colour; pixels are copied untranscoded.
    pub fn indexed8() -> Self {
        Self::new(8, ChannelLayout::default(), ChannelLayout::default(), ChannelLayout::default())
    }

    /// Bytes occupied by one hardware pixel; 0 for sub-byte depths.
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    /// Converts one hardware pixel word to the remote 15-bit layout.
    #[inline]
    pub fn transcode(&self, pixel: u32) -> u32 {
        extract(pixel, self.red_shift)
            | (extract(pixel, self.green_shift) << BITS_PER_SAMPLE)
            | (extract(pixel, self.blue_shift) << (2 * BITS_PER_SAMPLE))
    }

    /// The remote pixel format that matches this hardware layout.
    pub fn remote_format(&self) -> RemotePixelFormat {
        RemotePixelFormat {
            bits_per_sample: BITS_PER_SAMPLE,
            samples_per_pixel: 3,
            bytes_per_pixel: self.bytes_per_pixel().max(1),
        }
    }
}

#[inline]
fn extract(pixel: u32, shift: i32) -> u32 {
    if shift >= 0 {
        (pixel >> shift) & SAMPLE_MASK
    } else {
        (pixel << -shift) & SAMPLE_MASK
    }
}

/// Pixel format handed to the transport layer for the remote buffer.
///
/// Red occupies bits 0–4, green 5–9 and blue 10–14 of each pixel; the
/// pixel itself is stored little-endian in `bytes_per_pixel` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemotePixelFormat {
    pub bits_per_sample: u32,
    pub samples_per_pixel: u32,
    pub bytes_per_pixel: usize,
}

impl RemotePixelFormat {
    /// Splits a remote pixel value back into its (red, green, blue) samples.
    pub fn decode(&self, value: u32) -> (u32, u32, u32) {
        (
            value & SAMPLE_MASK,
            (value >> BITS_PER_SAMPLE) & SAMPLE_MASK,
            (value >> (2 * BITS_PER_SAMPLE)) & SAMPLE_MASK,
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
