//! # fbmirror-core
//!
//! Shared library for fbmirror containing the frame differ, the pixel
//! transcoder, the synthetic input state machines and the per-client
//! authorization model.
//!
//! It has no dependencies on device files, sockets or the remote-display
//! protocol; the server crate supplies those.
//!
//! # Architecture overview (for beginners)
//!
//! fbmirror lets someone watch and drive an embedded panel from a remote
//! viewer.  The panel's only local UI is a touch screen backed by a Linux
//! framebuffer; fbmirror reads the framebuffer, ships the changed region to
//! the viewer, and turns the viewer's clicks and keys back into touch and
//! keyboard events on the panel.
//!
//! This crate (`fbmirror-core`) is the part with the engineering weight:
//!
//! - **`framediff`** – compares the live surface with a shadow copy, works
//!   out the dirty rectangle, and transcodes changed pixels into the 15-bit
//!   remote format.  One strategy per {depth, rotation} combination.
//!
//! - **`input`** – the keyboard debounce, the touch session state machine,
//!   the canned button gestures and the `InputInjector` that ties them to
//!   the device sinks.
//!
//! - **`domain`** – pixel formats, dirty rectangles and the rights tiers
//!   and authorization table that gate privileged input.
//!
//! - **`keymap`** – the KeySym → evdev key table and evdev constants.

pub mod domain;
pub mod framediff;
pub mod input;
pub mod keymap;

// Re-export the most-used types at the crate root so callers can write
// `fbmirror_core::FrameDiffer` instead of `fbmirror_core::framediff::FrameDiffer`.
pub use domain::auth::{
    Admission, AuthError, AuthorizationTable, ClientId, Credential, CredentialSet, RightsTier,
};
pub use domain::dirty_rect::{BoundsTracker, DirtyRect};
pub use domain::pixel_format::{
    ChannelLayout, FormatError, PixelFormatDescriptor, RemotePixelFormat, Rotation,
};
pub use framediff::{DisplayGeometry, FrameDiffer, RemoteBuffer, ShadowBuffer, TranscodeStrategy};
pub use input::{
    DeviceVariant, Gesture, InjectorConfig, InputEvent, InputInjector, InputSink, KeyOutcome,
    MockInputSink, PointerOutcome, SinkError, TouchBounds,
};
