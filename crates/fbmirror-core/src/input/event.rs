//! The input-event record and the sink port it is written to.

use thiserror::Error;
use tracing::warn;

use crate::keymap::evdev;

/// One `{type, code, value}` input record.
///
/// The timestamp is not part of the record: sinks stamp each event with the
/// current time as it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub const fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }

    /// `EV_KEY` with value 1 for down and 0 for up.
    pub const fn key(code: u16, down: bool) -> Self {
        Self::new(evdev::EV_KEY, code, down as i32)
    }

    /// `EV_SYN / SYN_REPORT`.
    pub const fn sync() -> Self {
        Self::new(evdev::EV_SYN, evdev::SYN_REPORT, 0)
    }

    /// `EV_ABS` axis reading.
    pub const fn abs(code: u16, value: i32) -> Self {
        Self::new(evdev::EV_ABS, code, value)
    }

    /// `EV_MSC / MSC_SCAN`.
    pub const fn scan(value: i32) -> Self {
        Self::new(evdev::EV_MSC, evdev::MSC_SCAN, value)
    }

    /// `ABS_MT_TRACKING_ID`; `-1` ends the contact.
    pub const fn tracking_id(id: i32) -> Self {
        Self::abs(evdev::ABS_MT_TRACKING_ID, id)
    }

    pub fn is_sync(&self) -> bool {
        self.kind == evdev::EV_SYN
    }
}

/// Errors raised by an input sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The underlying device write failed.
    #[error("input device write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The device accepted fewer bytes than one full record.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// A simulated failure (used by the mock sink).
    #[error("sink failure: {0}")]
    Failed(String),
}

/// Write-only destination for synthetic input events.
///
/// Implemented by the Linux evdev device handle in the server crate and by
/// [`MockInputSink`](super::mock::MockInputSink) for tests.
pub trait InputSink: Send + Sync {
    /// Writes one event, stamping it with the current time.
    fn write_event(&self, event: &InputEvent) -> Result<(), SinkError>;
}

/// Writes `events` in order, logging and dropping any that fail.
///
/// A failure never aborts the rest of the sequence.  Returns the number of
/// events written.
pub fn write_sequence(sink: &dyn InputSink, events: &[InputEvent]) -> usize {
    let mut written = 0;
    for event in events {
        match sink.write_event(event) {
            Ok(()) => written += 1,
            Err(e) => warn!(
                "dropping input event (type {}, code {}, value {}): {e}",
                event.kind, event.code, event.value
            ),
        }
    }
    written
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mock::MockInputSink;

    #[test]
    fn test_constructors_use_evdev_types() {
        assert_eq!(InputEvent::key(28, true), InputEvent::new(1, 28, 1));
        assert_eq!(InputEvent::key(28, false).value, 0);
        assert_eq!(InputEvent::sync(), InputEvent::new(0, 0, 0));
        assert_eq!(InputEvent::scan(0x8B), InputEvent::new(4, 4, 0x8B));
        assert_eq!(InputEvent::tracking_id(-1), InputEvent::new(3, 0x39, -1));
    }

    #[test]
    fn test_write_sequence_preserves_order() {
        let sink = MockInputSink::new();
        let events = [InputEvent::key(1, true), InputEvent::sync()];

        let written = write_sequence(&sink, &events);

        assert_eq!(written, 2);
        assert_eq!(sink.recorded(), events.to_vec());
    }

    #[test]
    fn test_write_sequence_drops_failed_events_without_panicking() {
        let sink = MockInputSink::failing();

        let written = write_sequence(&sink, &[InputEvent::key(1, true), InputEvent::sync()]);

        assert_eq!(written, 0);
        assert!(sink.recorded().is_empty());
    }
}
