//! fbmirror-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does fbmirror-server do? (for beginners)
//!
//! The server runs on the panel itself.  It:
//!
//! 1. Maps the Linux framebuffer read-only and works out its pixel layout.
//! 2. Opens the keyboard and touch evdev nodes it will inject events into.
//! 3. Hands a remote-display transport a 15-bit copy of the screen and, on
//!    every cycle, the rectangle that changed.
//! 4. Checks each viewer's password to decide its rights tier, then replays
//!    the viewer's keys and clicks as keyboard and touch events.
//!
//! The pixel and input logic lives in `fbmirror-core`; this crate supplies
//! the devices, the configuration and the loop that ties them together.

/// Application layer: session handling and the service loop.
pub mod application;

/// Infrastructure layer: devices, transport contract and configuration.
pub mod infrastructure;
