//! A transport with no viewers.
//!
//! Used when the binary is built without a wire protocol.  The service loop
//! still runs its idle cycle, so the framebuffer mapping and the device
//! handles are exercised, but nothing ever connects.

use std::thread;
use std::time::Duration;

use fbmirror_core::{DirtyRect, RemoteBuffer};
use tracing::{trace, warn};

use super::{FramePublisher, RemoteDisplayTransport, SessionCallbacks, TransportError};

#[derive(Debug)]
pub struct HeadlessTransport {
    desktop_name: String,
    listen: String,
    published: u64,
}

impl HeadlessTransport {
    pub fn new(desktop_name: impl Into<String>, listen: impl Into<String>) -> Self {
        let transport = Self {
            desktop_name: desktop_name.into(),
            listen: listen.into(),
            published: 0,
        };
        warn!(
            "no remote-display protocol linked; '{}' will not accept viewers on {}",
            transport.desktop_name, transport.listen
        );
        transport
    }

    /// Frames handed over since start-up.
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl FramePublisher for HeadlessTransport {
    fn publish(&mut self, frame: &RemoteBuffer, dirty: DirtyRect) {
        self.published += 1;
        trace!(
            "discarding {}x{} frame update {dirty:?}",
            frame.width(),
            frame.height()
        );
    }
}

impl RemoteDisplayTransport for HeadlessTransport {
    fn client_count(&self) -> usize {
        0
    }

    fn process_events(
        &mut self,
        budget: Duration,
        _callbacks: &mut dyn SessionCallbacks,
    ) -> Result<(), TransportError> {
        thread::sleep(budget);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
