//! Dirty-region frame differ and pixel transcoder.
//!
//! The differ compares the live display surface against a shadow copy of
//! the last frame it saw.  Every pixel that changed is copied into the
//! shadow, transcoded into the remote buffer, and folded into the dirty
//! rectangle returned to the caller.
//!
//! # Ownership
//!
//! ```text
//!                     ┌──────────────┐
//!   &[u8] surface ───►│ FrameDiffer  │──► DirtyRect
//!                     │  (strategy)  │
//!   &mut ShadowBuffer ┤              ├ &mut RemoteBuffer
//!                     └──────────────┘
//! ```
//!
//! [`FrameDiffer`] holds only immutable configuration: the geometry and the
//! transcoding strategy chosen for it.  The shadow and remote buffers are
//! owned by the caller and passed in explicitly, so calling
//! [`FrameDiffer::diff_and_transcode`] from inside a keyboard callback while
//! the service loop is suspended in the transport is no different from
//! calling it from the loop itself.
//!
//! # Strategies
//!
//! One strategy is selected at construction from the depth and rotation:
//!
//! | Depth            | Rotation        | Strategy            |
//! |------------------|-----------------|---------------------|
//! | 1 bpp            | 0°              | [`mono::MonoStrategy`] |
//! | 24 bpp           | 0°              | [`packed24::Packed24Strategy`] |
//! | 8 / 16 / 32 bpp  | 0°              | [`word::WordStrategy`] |
//! | 16 bpp           | 90° / 180° / 270° | [`rotated16::Rotated16Strategy`] |
//!
//! Any other combination is rejected with [`FormatError::Unsupported`].

pub mod mono;
pub mod packed24;
pub mod rotated16;
pub mod word;

use tracing::debug;

use crate::domain::dirty_rect::{BoundsTracker, DirtyRect};
use crate::domain::pixel_format::{FormatError, PixelFormatDescriptor, RemotePixelFormat, Rotation};

/// Geometry of the hardware display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormatDescriptor,
    pub rotation: Rotation,
}

impl DisplayGeometry {
    pub fn new(width: u32, height: u32, format: PixelFormatDescriptor, rotation: Rotation) -> Self {
        Self {
            width,
            height,
            format,
            rotation,
        }
    }

    /// Bytes in one source row.
    pub fn row_bytes(&self) -> usize {
        (self.width as usize * self.format.bits_per_pixel as usize).div_ceil(8)
    }

    /// Bytes in the whole source surface.
    pub fn frame_size(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    /// Width of the remote view after rotation.
    pub fn remote_width(&self) -> u32 {
        if self.rotation.swaps_axes() {
            self.height
        } else {
            self.width
        }
    }

    /// Height of the remote view after rotation.
    pub fn remote_height(&self) -> u32 {
        if self.rotation.swaps_axes() {
            self.width
        } else {
            self.height
        }
    }

    pub fn remote_format(&self) -> RemotePixelFormat {
        self.format.remote_format()
    }

    /// Bytes in one remote row.
    pub fn remote_stride(&self) -> usize {
        self.remote_width() as usize * self.remote_format().bytes_per_pixel
    }

    pub fn remote_frame_size(&self) -> usize {
        self.remote_stride() * self.remote_height() as usize
    }
}

/// Last-transcoded copy of the display surface, same layout as the surface.
#[derive(Debug, Clone)]
pub struct ShadowBuffer {
    bytes: Vec<u8>,
}

impl ShadowBuffer {
    /// A zeroed shadow for `geometry`.
    pub fn new(geometry: &DisplayGeometry) -> Self {
        Self {
            bytes: vec![0; geometry.frame_size()],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Transcoded pixels in the wire format expected by the transport.
#[derive(Debug, Clone)]
pub struct RemoteBuffer {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: RemotePixelFormat,
}

impl RemoteBuffer {
    /// A remote buffer for `geometry`.
    ///
    /// Monochrome surfaces start all-white (`0xFF`, every pixel "off");
    /// everything else starts black.
    pub fn new(geometry: &DisplayGeometry) -> Self {
        let fill = if geometry.format.bits_per_pixel == 1 { 0xFF } else { 0x00 };
        Self {
            bytes: vec![fill; geometry.remote_frame_size()],
            width: geometry.remote_width(),
            height: geometry.remote_height(),
            format: geometry.remote_format(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> RemotePixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel
    }

    /// Reads the little-endian pixel value at `(x, y)`.
    ///
    /// Returns `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel;
        let start = y as usize * self.stride() + x as usize * bpp;
        let mut word = [0u8; 4];
        word[..bpp].copy_from_slice(self.bytes.get(start..start + bpp)?);
        Some(u32::from_le_bytes(word))
    }
}

/// One way of walking the surface for a particular {depth, rotation}.
///
/// Implementations compare `surface` against `shadow`, update the shadow
/// and remote bytes of every changed pixel, and report each change to
/// `bounds`.  Buffer lengths have been validated by the caller.
pub trait TranscodeStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn scan(&self, surface: &[u8], shadow: &mut [u8], remote: &mut [u8], bounds: &mut BoundsTracker);
}

/// Compares the live surface with the shadow and produces the dirty rectangle.
pub struct FrameDiffer {
    geometry: DisplayGeometry,
    strategy: Box<dyn TranscodeStrategy>,
}

impl std::fmt::Debug for FrameDiffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDiffer")
            .field("geometry", &self.geometry)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl FrameDiffer {
    /// Selects the transcoding strategy for `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::EmptyGeometry`] for a zero-sized surface and
    /// [`FormatError::Unsupported`] for a depth/rotation combination with
    /// no strategy.
    pub fn new(geometry: DisplayGeometry) -> Result<Self, FormatError> {
        if geometry.width == 0 || geometry.height == 0 {
            return Err(FormatError::EmptyGeometry {
                width: geometry.width,
                height: geometry.height,
            });
        }
        let strategy: Box<dyn TranscodeStrategy> =
            match (geometry.format.bits_per_pixel, geometry.rotation) {
                (1, Rotation::None) => Box::new(mono::MonoStrategy::new(&geometry)),
                (24, Rotation::None) => Box::new(packed24::Packed24Strategy::new(&geometry)),
                (8 | 16 | 32, Rotation::None) => Box::new(word::WordStrategy::new(&geometry)),
                (16, rotation) => Box::new(rotated16::Rotated16Strategy::new(&geometry, rotation)),
                (bits_per_pixel, rotation) => {
                    return Err(FormatError::Unsupported {
                        bits_per_pixel,
                        rotation: rotation.degrees(),
                    })
                }
            };
        debug!(
            "frame differ: {}x{} {} bpp, rotation {}, strategy {}",
            geometry.width,
            geometry.height,
            geometry.format.bits_per_pixel,
            geometry.rotation,
            strategy.name()
        );
        Ok(Self { geometry, strategy })
    }

    /// Uses an explicit strategy instead of the one selected from the geometry.
    pub fn with_strategy(geometry: DisplayGeometry, strategy: Box<dyn TranscodeStrategy>) -> Self {
        Self { geometry, strategy }
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// A zeroed shadow buffer sized for this differ.
    pub fn new_shadow(&self) -> ShadowBuffer {
        ShadowBuffer::new(&self.geometry)
    }

    /// A freshly filled remote buffer sized for this differ.
    pub fn new_remote(&self) -> RemoteBuffer {
        RemoteBuffer::new(&self.geometry)
    }

    /// Diffs `surface` against `shadow`, transcoding changes into `remote`.
    ///
    /// Identical buffers short-circuit to [`DirtyRect::EMPTY`] without
    /// touching either buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::LengthMismatch`] if any buffer does not match
    /// the differ's geometry.
    pub fn diff_and_transcode(
        &self,
        surface: &[u8],
        shadow: &mut ShadowBuffer,
        remote: &mut RemoteBuffer,
    ) -> Result<DirtyRect, FormatError> {
        let frame_size = self.geometry.frame_size();
        check_len(frame_size, surface.len())?;
        check_len(frame_size, shadow.bytes.len())?;
        check_len(self.geometry.remote_frame_size(), remote.bytes.len())?;

        if surface == shadow.bytes.as_slice() {
            return Ok(DirtyRect::EMPTY);
        }

        let mut bounds = BoundsTracker::new();
        self.strategy
            .scan(surface, &mut shadow.bytes, &mut remote.bytes, &mut bounds);
        Ok(bounds.finish())
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), FormatError> {
    if expected == actual {
        Ok(())
    } else {
        Err(FormatError::LengthMismatch { expected, actual })
    }
}

/// Reads up to four bytes as a little-endian word, zero-padding short tails.
#[inline]
pub(crate) fn read_word(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    let n = bytes.len().min(4);
    word[..n].copy_from_slice(&bytes[..n]);
    u32::from_le_bytes(word)
}

/// Writes the low `out.len()` bytes of `value`, little-endian.
#[inline]
pub(crate) fn write_word(out: &mut [u8], value: u32) {
    let bytes = value.to_le_bytes();
    let n = out.len().min(4);
    out[..n].copy_from_slice(&bytes[..n]);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
