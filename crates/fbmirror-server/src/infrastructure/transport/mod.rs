//! The contract between the mirroring service and a remote-display transport.
//!
//! The transport owns the sockets, the wire protocol and the challenge
//! crypto.  The service only needs three things from it:
//!
//! | Trait                      | Direction          | Purpose                                   |
//! |----------------------------|--------------------|-------------------------------------------|
//! | [`FramePublisher`]         | service → viewer   | hand over the remote buffer + dirty rect  |
//! | [`RemoteDisplayTransport`] | service → transport| run one bounded event-processing step     |
//! | [`SessionCallbacks`]       | transport → service| deliver auth, key, pointer and disconnect |
//!
//! # Re-entrancy (for beginners)
//!
//! Callbacks run synchronously *inside* [`RemoteDisplayTransport::process_events`].
//! A key callback that wants the display refreshed receives a
//! `&mut dyn FramePublisher` from the transport, so it can diff and publish
//! without borrowing the transport a second time.  Everything stays on one
//! thread; no locks are involved.
//!
//! Two implementations ship with the crate:
//!
//! - **`headless`** – accepts no viewers; used when no wire protocol is
//!   linked so the capture and input paths can still be exercised on a panel.
//! - **`scripted`** – replays a queue of events; always compiled for tests.

pub mod headless;
pub mod scripted;

use std::time::Duration;

use fbmirror_core::{ClientId, DirtyRect, RemoteBuffer};
use thiserror::Error;

pub use headless::HeadlessTransport;
pub use scripted::{ScriptedEvent, ScriptedTransport};

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport shut down and will deliver no more events.
    #[error("transport closed")]
    Closed,
}

/// Answer to a client's authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Let the session in.  `view_only` tells the transport to discard the
    /// session's input before it reaches any callback.
    Accept { view_only: bool },
    Reject,
}

/// Receives frame updates for delivery to viewers.
pub trait FramePublisher {
    /// `dirty` is in remote coordinates with an exclusive right and bottom edge.
    fn publish(&mut self, frame: &RemoteBuffer, dirty: DirtyRect);
}

/// Callbacks invoked by the transport while it processes events.
pub trait SessionCallbacks {
    /// `verifies` checks the client's challenge response against one
    /// candidate password.
    fn on_authenticate(
        &mut self,
        client: ClientId,
        verifies: &mut dyn FnMut(&str) -> bool,
    ) -> AuthVerdict;

    fn on_key(&mut self, client: ClientId, symbol: u32, down: bool, frame: &mut dyn FramePublisher);

    fn on_pointer(&mut self, client: ClientId, button_mask: u8, x: i32, y: i32);

    fn on_disconnect(&mut self, client: ClientId);
}

/// A remote-display server the service loop can drive.
pub trait RemoteDisplayTransport: FramePublisher {
    /// Number of connected viewers.
    fn client_count(&self) -> usize;

    /// Processes pending network events for at most `budget`, invoking
    /// `callbacks` for each one in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the transport can no longer run.
    fn process_events(
        &mut self,
        budget: Duration,
        callbacks: &mut dyn SessionCallbacks,
    ) -> Result<(), TransportError>;
}
