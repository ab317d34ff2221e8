//! Infrastructure layer for the mirroring service.
//!
//! Contains the OS-facing adapters: the framebuffer mapping, the evdev input
//! sinks, the remote-display transport contract and the configuration file.
//!
//! **Dependency rule**: this layer may depend on `fbmirror_core`, but MUST NOT
//! import from `application`.
//!
//! # Sub-modules
//!
//! - **`framebuffer`** – the `DisplaySource` port, the Linux fbdev mapping and
//!   an in-memory surface for tests.
//!
//! - **`input_device`** – the Linux evdev `InputSink` and the touch range query.
//!
//! - **`transport`** – what the service needs from a remote-display server,
//!   plus headless and scripted implementations.
//!
//! - **`storage`** – TOML configuration loading and validation.

pub mod framebuffer;
pub mod input_device;
pub mod storage;
pub mod transport;

use std::path::PathBuf;

use fbmirror_core::FormatError;
use thiserror::Error;

/// Error type for device handles (framebuffer and input devices).
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{request} failed on {path}: {source}")]
    Ioctl {
        path: PathBuf,
        request: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot map {path}: {source}")]
    Mmap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),
}
