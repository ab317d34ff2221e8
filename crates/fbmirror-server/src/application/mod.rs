//! Application layer of the mirroring service.
//!
//! # What use cases does the service have?
//!
//! - **`session`** – decides whether a viewer may connect and with which
//!   rights, and turns its key and pointer events into injected input.
//!
//! - **`service_loop`** – the main loop: lets the transport deliver events,
//!   diffs the framebuffer, publishes what changed and logs the frame rate.

pub mod service_loop;
pub mod session;
