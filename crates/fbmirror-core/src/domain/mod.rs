//! Domain types for fbmirror.
//!
//! Pure data and rules with no device or transport dependencies:
//!
//! - **`pixel_format`** – how hardware pixels are laid out and how a single
//!   pixel word is transcoded into the remote 15-bit format.
//! - **`dirty_rect`** – the per-pass dirty rectangle and the bounds
//!   accumulation rule the transport expects.
//! - **`auth`** – rights tiers, configured credentials and the bounded table
//!   of authenticated sessions.
//!
//! Everything here compiles and tests on any platform without a framebuffer
//! or input device present.

pub mod auth;
pub mod dirty_rect;
pub mod pixel_format;
