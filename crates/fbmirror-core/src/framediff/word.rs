//! Unrotated 8, 16 and 32 bpp surfaces, compared one 32-bit word at a time.
//!
//! | Depth | Pixels per word | Transcoding                         |
//! |-------|-----------------|-------------------------------------|
//! | 8     | 4               | none, the word is copied as is      |
//! | 16    | 2               | each 16-bit half transcoded alone   |
//! | 32    | 1               | the whole word                      |
//!
//! Words are taken row by row, so a row whose length is not a multiple of
//! four bytes ends in a short word and no word straddles two rows.  Inside
//! a changed word, each pixel that differs is reported to the bounds
//! tracker at its own (x, y).

use super::{read_word, write_word, DisplayGeometry, TranscodeStrategy};
use crate::domain::dirty_rect::BoundsTracker;
use crate::domain::pixel_format::PixelFormatDescriptor;

const WORD_BYTES: usize = 4;

/// Word-at-a-time differ.
#[derive(Debug, Clone, Copy)]
pub struct WordStrategy {
    width: usize,
    bytes_per_pixel: usize,
    format: PixelFormatDescriptor,
}

impl WordStrategy {
    pub fn new(geometry: &DisplayGeometry) -> Self {
        Self {
            width: geometry.width as usize,
            bytes_per_pixel: geometry.format.bytes_per_pixel().max(1),
            format: geometry.format,
        }
    }

    fn pixels_per_word(&self) -> usize {
        WORD_BYTES / self.bytes_per_pixel
    }

    #[inline]
    fn transcode_word(&self, word: u32) -> u32 {
        match self.bytes_per_pixel {
            4 => self.format.transcode(word),
            2 => self.format.transcode(word & 0xFFFF) | (self.format.transcode(word >> 16) << 16),
            _ => word,
        }
    }
}

impl TranscodeStrategy for WordStrategy {
    fn name(&self) -> &'static str {
        "word"
    }

    fn scan(&self, surface: &[u8], shadow: &mut [u8], remote: &mut [u8], bounds: &mut BoundsTracker) {
        let row_bytes = self.width * self.bytes_per_pixel;
        let rows = surface
            .chunks(row_bytes)
            .zip(shadow.chunks_mut(row_bytes))
            .zip(remote.chunks_mut(row_bytes));

        for (y, ((src_row, seen_row), out_row)) in rows.enumerate() {
            if src_row == &*seen_row {
                continue;
            }
            let words = src_row
                .chunks(WORD_BYTES)
                .zip(seen_row.chunks_mut(WORD_BYTES))
                .zip(out_row.chunks_mut(WORD_BYTES));

            for (index, ((src, seen), out)) in words.enumerate() {
                if src == &*seen {
                    continue;
                }
                let x = index * self.pixels_per_word();
                let pixels = src
                    .chunks(self.bytes_per_pixel)
                    .zip(seen.chunks(self.bytes_per_pixel));
                for (offset, (new, old)) in pixels.enumerate() {
                    if new != old {
                        bounds.add((x + offset) as i32, y as i32);
                    }
                }
                seen.copy_from_slice(src);
                write_word(out, self.transcode_word(read_word(src)));
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
