//! 16 bpp surfaces mirrored through a rotation.
//!
//! Pixels are compared one at a time.  A changed source pixel at `(x, y)` is
//! transcoded and written at its rotated position `(x2, y2)` in a remote
//! buffer whose width and height are swapped for 90° and 270°.  Bounds are
//! accumulated in remote (rotated) coordinates.

use super::{DisplayGeometry, TranscodeStrategy};
use crate::domain::dirty_rect::BoundsTracker;
use crate::domain::pixel_format::{PixelFormatDescriptor, Rotation};

const BYTES_PER_PIXEL: usize = 2;

/// Pixel-at-a-time differ for rotated RGB565-style surfaces.
#[derive(Debug, Clone, Copy)]
pub struct Rotated16Strategy {
    width: u32,
    height: u32,
    remote_width: usize,
    rotation: Rotation,
    format: PixelFormatDescriptor,
}

impl Rotated16Strategy {
    pub fn new(geometry: &DisplayGeometry, rotation: Rotation) -> Self {
        let remote_width = if rotation.swaps_axes() {
            geometry.height
        } else {
            geometry.width
        };
        Self {
            width: geometry.width,
            height: geometry.height,
            remote_width: remote_width as usize,
            rotation,
            format: geometry.format,
        }
    }
}

impl TranscodeStrategy for Rotated16Strategy {
    fn name(&self) -> &'static str {
        "rotated16"
    }

    fn scan(&self, surface: &[u8], shadow: &mut [u8], remote: &mut [u8], bounds: &mut BoundsTracker) {
        let width = self.width as usize;
        let pixels = surface
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(shadow.chunks_exact_mut(BYTES_PER_PIXEL));

        for (index, (src, seen)) in pixels.enumerate() {
            if src == seen {
                continue;
            }
            seen.copy_from_slice(src);

            let x = (index % width) as u32;
            let y = (index / width) as u32;
            let (x2, y2) = self.rotation.map(x, y, self.width, self.height);

            let pixel = u32::from(u16::from_le_bytes([src[0], src[1]]));
            let value = self.format.transcode(pixel) as u16;
            let at = (y2 as usize * self.remote_width + x2 as usize) * BYTES_PER_PIXEL;
            if let Some(out) = remote.get_mut(at..at + BYTES_PER_PIXEL) {
                out.copy_from_slice(&value.to_le_bytes());
            }

            bounds.add(x2 as i32, y2 as i32);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
