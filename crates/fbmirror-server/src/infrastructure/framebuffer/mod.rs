//! Display sources: where the service reads the panel's pixels from.
//!
//! [`DisplaySource`] is the port the service loop depends on.  The Linux
//! implementation maps `/dev/fbN` read-only; [`MemoryDisplay`] is always
//! compiled so tests can drive the loop with synthetic frames.

pub mod memory;

#[cfg(target_os = "linux")]
pub mod linux;

use fbmirror_core::DisplayGeometry;

pub use memory::MemoryDisplay;
pub use crate::infrastructure::DeviceError;

#[cfg(target_os = "linux")]
pub use linux::LinuxFramebuffer;

/// A readable display surface.
pub trait DisplaySource {
    fn geometry(&self) -> &DisplayGeometry;

    /// Captures the current surface contents, `geometry().frame_size()`
    /// bytes.  The slice stays unchanged until the next call.
    fn frame(&mut self) -> &[u8];
}
