//! 1-bit monochrome surfaces.
//!
//! Each source byte holds eight pixels, most significant bit first.  A set
//! bit is an "on" (dark) pixel and becomes `0x00` in the remote buffer; a
//! clear bit becomes `0xFF`.  The remote buffer holds one byte per pixel.
//!
//! A changed byte rewrites all eight remote pixels, but only the bits that
//! actually flipped are reported to the bounds tracker.

use super::{DisplayGeometry, TranscodeStrategy};
use crate::domain::dirty_rect::BoundsTracker;

const PIXELS_PER_BYTE: usize = 8;

const ON: u8 = 0x00;
const OFF: u8 = 0xFF;

/// Byte-at-a-time differ for 1 bpp surfaces.
#[derive(Debug, Clone, Copy)]
pub struct MonoStrategy {
    width: usize,
    row_bytes: usize,
}

impl MonoStrategy {
    pub fn new(geometry: &DisplayGeometry) -> Self {
        Self {
            width: geometry.width as usize,
            row_bytes: geometry.row_bytes(),
        }
    }
}

impl TranscodeStrategy for MonoStrategy {
    fn name(&self) -> &'static str {
        "mono"
    }

    fn scan(&self, surface: &[u8], shadow: &mut [u8], remote: &mut [u8], bounds: &mut BoundsTracker) {
        let rows = surface
            .chunks(self.row_bytes)
            .zip(shadow.chunks_mut(self.row_bytes))
            .zip(remote.chunks_mut(self.width));

        for (y, ((src_row, shadow_row), remote_row)) in rows.enumerate() {
            for (col, (&pixels, seen)) in src_row.iter().zip(shadow_row.iter_mut()).enumerate() {
                let flipped = pixels ^ *seen;
                if flipped == 0 {
                    continue;
                }
                *seen = pixels;

                let x = col * PIXELS_PER_BYTE;
                for bit in 0..PIXELS_PER_BYTE {
                    let Some(out) = remote_row.get_mut(x + bit) else {
                        break;
                    };
                    *out = if pixels & (0x80 >> bit) != 0 { ON } else { OFF };
                    if flipped & (0x80 >> bit) != 0 {
                        bounds.add((x + bit) as i32, y as i32);
                    }
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::FrameDiffer;
    use super::*;
    use crate::domain::dirty_rect::DirtyRect;
    use crate::domain::pixel_format::{PixelFormatDescriptor, Rotation};

    fn differ(width: u32, height: u32) -> FrameDiffer {
        FrameDiffer::new(DisplayGeometry::new(
            width,
            height,
            PixelFormatDescriptor::mono(),
            Rotation::None,
        ))
        .unwrap()
    }

    #[test]
    fn test_set_bits_become_dark_msb_first() {
        // Arrange
        let differ = differ(16, 2);
        let mut shadow = differ.new_shadow();
        let mut remote = differ.new_remote();
        let mut surface = vec![0u8; differ.geometry().frame_size()];
        surface[0] = 0b1000_0001;

        // Act
        let rect = differ.diff_and_transcode(&surface, &mut shadow, &mut remote).unwrap();

        // Assert
        assert_eq!(remote.pixel(0, 0), Some(0x00));
        assert_eq!(remote.pixel(1, 0), Some(0xFF));
        assert_eq!(remote.pixel(7, 0), Some(0x00));
        assert_eq!(remote.pixel(8, 0), Some(0xFF));
        // Bit 0 sets min_x, bit 7 extends max_x.
        assert_eq!(rect, DirtyRect { min_x: 0, min_y: 0, max_x: 9, max_y: 1 });
    }

    #[test]
    fn test_cleared_byte_returns_to_white() {
        let differ = differ(8, 1);
        let mut shadow = differ.new_shadow();
        let mut remote = differ.new_remote();

        differ.diff_and_transcode(&[0xFF], &mut shadow, &mut remote).unwrap();
        assert!(remote.as_bytes().iter().all(|&b| b == 0x00));

        let rect = differ.diff_and_transcode(&[0x00], &mut shadow, &mut remote).unwrap();
        assert!(remote.as_bytes().iter().all(|&b| b == 0xFF));
        assert!(!rect.is_empty());
    }

    #[test]
    fn test_flipped_bit_reports_its_own_pixel() {
        let differ = differ(16, 3);
        let mut shadow = differ.new_shadow();
        let mut remote = differ.new_remote();
        let mut surface = vec![0u8; differ.geometry().frame_size()];
        // Row 2, second byte: pixels 8..16.
        surface[5] = 0x40;

        let rect = differ.diff_and_transcode(&surface, &mut shadow, &mut remote).unwrap();

        assert_eq!(remote.pixel(9, 2), Some(0x00));
        assert!(rect.contains(9, 2));
        assert_eq!(rect.min_x, 9);
        assert_eq!(rect.min_y, 2);
        assert_eq!(rect.max_y, 3);
    }

    #[test]
    fn test_partial_trailing_byte_stays_inside_row() {
        // 10 pixels wide: the second byte only carries two real pixels.
        let differ = differ(10, 2);
        let mut shadow = differ.new_shadow();
        let mut remote = differ.new_remote();
        let surface = vec![0x00, 0xFF, 0x00, 0x00];

        differ.diff_and_transcode(&surface, &mut shadow, &mut remote).unwrap();

        assert_eq!(remote.pixel(8, 0), Some(0x00));
        assert_eq!(remote.pixel(9, 0), Some(0x00));
        assert_eq!(remote.pixel(0, 1), Some(0xFF));
    }
}
