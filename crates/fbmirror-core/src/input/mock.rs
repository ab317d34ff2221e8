//! Mock input sink for unit testing.
//!
//! # Why a mock sink?
//!
//! The real sink writes `input_event` records to a device node under
//! `/dev/input`.  That needs the device to exist, injects real key presses
//! on the machine running the tests, and leaves nothing to inspect
//! afterwards.
//!
//! `MockInputSink` replaces the device with in-memory recording.  Every
//! written event is pushed into a `Mutex<Vec<InputEvent>>` so assertions can
//! check exactly what was emitted and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let keyboard = Arc::new(MockInputSink::new());
//! let mut injector = InputInjector::new(config)
//!     .with_keyboard(Arc::clone(&keyboard) as Arc<dyn InputSink>);
//!
//! injector.key(XK_RETURN, true, client, &table, Instant::now());
//!
//! assert_eq!(keyboard.recorded(), vec![InputEvent::key(28, true), InputEvent::sync()]);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` (or build with [`MockInputSink::failing`]) to
//! make every write return [`SinkError::Failed`].  This exercises the
//! log-and-drop path without a broken device.

use std::sync::{Mutex, PoisonError};

use super::event::{InputEvent, InputSink, SinkError};

/// A sink that records events instead of writing them to a device.
#[derive(Debug, Default)]
pub struct MockInputSink {
    /// Every successfully written event, in order.
    pub events: Mutex<Vec<InputEvent>>,
    /// When `true`, every write fails and nothing is recorded.
    pub should_fail: bool,
}

impl MockInputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose writes always fail.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded events.
    pub fn recorded(&self) -> Vec<InputEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl InputSink for MockInputSink {
    fn write_event(&self, event: &InputEvent) -> Result<(), SinkError> {
        if self.should_fail {
            return Err(SinkError::Failed("mock failure".into()));
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
        Ok(())
    }
}
