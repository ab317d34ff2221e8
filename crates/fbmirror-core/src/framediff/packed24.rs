//! 24-bit packed surfaces, three bytes per pixel.

use super::{DisplayGeometry, TranscodeStrategy};
use crate::domain::dirty_rect::BoundsTracker;
use crate::domain::pixel_format::PixelFormatDescriptor;

const BYTES_PER_PIXEL: usize = 3;

/// Pixel-at-a-time differ for 24 bpp surfaces.
#[derive(Debug, Clone, Copy)]
pub struct Packed24Strategy {
    width: usize,
    format: PixelFormatDescriptor,
}

impl Packed24Strategy {
    pub fn new(geometry: &DisplayGeometry) -> Self {
        Self {
            width: geometry.width as usize,
            format: geometry.format,
        }
    }
}

impl TranscodeStrategy for Packed24Strategy {
    fn name(&self) -> &'static str {
        "packed24"
    }

    fn scan(&self, surface: &[u8], shadow: &mut [u8], remote: &mut [u8], bounds: &mut BoundsTracker) {
        let pixels = surface
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(shadow.chunks_exact_mut(BYTES_PER_PIXEL))
            .zip(remote.chunks_exact_mut(BYTES_PER_PIXEL));

        for (index, ((src, seen), out)) in pixels.enumerate() {
            if src == seen {
                continue;
            }
            seen.copy_from_slice(src);

            let pixel = u32::from_le_bytes([src[0], src[1], src[2], 0]);
            let value = self.format.transcode(pixel).to_le_bytes();
            out.copy_from_slice(&value[..BYTES_PER_PIXEL]);

            bounds.add((index % self.width) as i32, (index / self.width) as i32);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
