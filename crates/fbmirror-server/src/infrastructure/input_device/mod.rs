//! Input device handles the injector writes synthetic events to.
//!
//! On Linux an [`EvdevSink`] writes `struct input_event` records to an
//! existing `/dev/input/eventN` node.  Other targets have no device backend;
//! the service still mirrors the display there, with input disabled.

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::EvdevSink;
