//! In-memory display surface.

use fbmirror_core::{DisplayGeometry, FormatError};

use super::DisplaySource;

/// A display whose pixels live in a `Vec<u8>` the caller can rewrite.
#[derive(Debug, Clone)]
pub struct MemoryDisplay {
    geometry: DisplayGeometry,
    pixels: Vec<u8>,
}

impl MemoryDisplay {
    /// A zero-filled surface.
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self {
            pixels: vec![0; geometry.frame_size()],
            geometry,
        }
    }

    /// Replaces the whole surface.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::LengthMismatch`] if `pixels` is not exactly one
    /// frame long.
    pub fn set_frame(&mut self, pixels: Vec<u8>) -> Result<(), FormatError> {
        if pixels.len() != self.pixels.len() {
            return Err(FormatError::LengthMismatch {
                expected: self.pixels.len(),
                actual: pixels.len(),
            });
        }
        self.pixels = pixels;
        Ok(())
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}

impl DisplaySource for MemoryDisplay {
    fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    fn frame(&mut self) -> &[u8] {
        &self.pixels
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
