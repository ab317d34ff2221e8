//! Scripted transport for unit and integration testing.
//!
//! Plays back batches of viewer events, one batch per
//! [`RemoteDisplayTransport::process_events`] call, and records everything
//! the service hands back: authentication verdicts, published frames and
//! the budgets it was given.  Like a real transport it tracks connected
//! sessions, drops input from unknown and view-only sessions, and only
//! reports a disconnect for a session it admitted.
//!
//! Passwords are compared in plain text in place of a challenge-response.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use fbmirror_core::{ClientId, DirtyRect, RemoteBuffer};

use super::{AuthVerdict, FramePublisher, RemoteDisplayTransport, SessionCallbacks, TransportError};

/// One event a viewer would cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedEvent {
    Connect { client: ClientId, password: String },
    Key { client: ClientId, symbol: u32, down: bool },
    Pointer { client: ClientId, button_mask: u8, x: i32, y: i32 },
    Disconnect { client: ClientId },
}

/// A frame update as the viewer would have received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFrame {
    pub dirty: DirtyRect,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Default)]
struct FrameLog(Vec<PublishedFrame>);

impl FramePublisher for FrameLog {
    fn publish(&mut self, frame: &RemoteBuffer, dirty: DirtyRect) {
        self.0.push(PublishedFrame {
            dirty,
            pixels: frame.as_bytes().to_vec(),
        });
    }
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    batches: VecDeque<Vec<ScriptedEvent>>,
    /// Connected sessions and whether each is view-only.
    sessions: HashMap<ClientId, bool>,
    frames: FrameLog,
    verdicts: Vec<(ClientId, AuthVerdict)>,
    budgets: Vec<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues events to be delivered by a single `process_events` call.
    pub fn push_batch(&mut self, events: Vec<ScriptedEvent>) {
        self.batches.push_back(events);
    }

    pub fn is_drained(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn frames(&self) -> &[PublishedFrame] {
        &self.frames.0
    }

    pub fn verdicts(&self) -> &[(ClientId, AuthVerdict)] {
        &self.verdicts
    }

    /// Budgets passed to `process_events`, in call order.
    pub fn budgets(&self) -> &[Duration] {
        &self.budgets
    }

    fn accepts_input(&self, client: ClientId) -> bool {
        self.sessions.get(&client) == Some(&false)
    }
}

impl FramePublisher for ScriptedTransport {
    fn publish(&mut self, frame: &RemoteBuffer, dirty: DirtyRect) {
        self.frames.publish(frame, dirty);
    }
}

impl RemoteDisplayTransport for ScriptedTransport {
    fn client_count(&self) -> usize {
        self.sessions.len()
    }

    fn process_events(
        &mut self,
        budget: Duration,
        callbacks: &mut dyn SessionCallbacks,
    ) -> Result<(), TransportError> {
        self.budgets.push(budget);
        let Some(batch) = self.batches.pop_front() else {
            return Ok(());
        };

        for event in batch {
            match event {
                ScriptedEvent::Connect { client, password } => {
                    let verdict =
                        callbacks.on_authenticate(client, &mut |candidate: &str| candidate == password);
                    if let AuthVerdict::Accept { view_only } = verdict {
                        self.sessions.insert(client, view_only);
                    }
                    self.verdicts.push((client, verdict));
                }
                ScriptedEvent::Key { client, symbol, down } => {
                    if self.accepts_input(client) {
                        callbacks.on_key(client, symbol, down, &mut self.frames);
                    }
                }
                ScriptedEvent::Pointer { client, button_mask, x, y } => {
                    if self.accepts_input(client) {
                        callbacks.on_pointer(client, button_mask, x, y);
                    }
                }
                ScriptedEvent::Disconnect { client } => {
                    if self.sessions.remove(&client).is_some() {
                        callbacks.on_disconnect(client);
                    }
                }
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Callbacks that accept one password and log what they were given.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SessionCallbacks for Recorder {
        fn on_authenticate(
            &mut self,
            _client: ClientId,
            verifies: &mut dyn FnMut(&str) -> bool,
        ) -> AuthVerdict {
            if verifies("rw") {
                AuthVerdict::Accept { view_only: false }
            } else if verifies("ro") {
                AuthVerdict::Accept { view_only: true }
            } else {
                AuthVerdict::Reject
            }
        }

        fn on_key(&mut self, _client: ClientId, symbol: u32, down: bool, _frame: &mut dyn FramePublisher) {
            self.calls.push(format!("key {symbol:#x} {down}"));
        }

        fn on_pointer(&mut self, _client: ClientId, button_mask: u8, x: i32, y: i32) {
            self.calls.push(format!("pointer {button_mask} {x} {y}"));
        }

        fn on_disconnect(&mut self, _client: ClientId) {
            self.calls.push("disconnect".to_string());
        }
    }

    #[test]
    fn test_one_batch_per_process_call() {
        // Arrange
        let client = Uuid::new_v4();
        let mut transport = ScriptedTransport::new();
        let mut recorder = Recorder::default();
        transport.push_batch(vec![ScriptedEvent::Connect { client, password: "rw".into() }]);
        transport.push_batch(vec![ScriptedEvent::Key { client, symbol: 0xff0d, down: true }]);

        // Act
        transport.process_events(Duration::from_millis(5), &mut recorder).unwrap();

        // Assert
        assert_eq!(transport.client_count(), 1);
        assert!(recorder.calls.is_empty());
        assert!(!transport.is_drained());
    }

    #[test]
    fn test_view_only_and_unknown_input_never_reaches_callbacks() {
        // Arrange
        let viewer = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut transport = ScriptedTransport::new();
        let mut recorder = Recorder::default();
        transport.push_batch(vec![
            ScriptedEvent::Connect { client: viewer, password: "ro".into() },
            ScriptedEvent::Key { client: viewer, symbol: 0xff0d, down: true },
            ScriptedEvent::Pointer { client: stranger, button_mask: 1, x: 1, y: 1 },
        ]);

        // Act
        transport.process_events(Duration::ZERO, &mut recorder).unwrap();

        // Assert
        assert_eq!(transport.verdicts(), &[(viewer, AuthVerdict::Accept { view_only: true })]);
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_rejected_client_is_not_tracked_or_disconnected() {
        let client = Uuid::new_v4();
        let mut transport = ScriptedTransport::new();
        let mut recorder = Recorder::default();
        transport.push_batch(vec![
            ScriptedEvent::Connect { client, password: "nope".into() },
            ScriptedEvent::Disconnect { client },
        ]);

        transport.process_events(Duration::ZERO, &mut recorder).unwrap();

        assert_eq!(transport.client_count(), 0);
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_records_budgets_even_without_events() {
        let mut transport = ScriptedTransport::new();
        let mut recorder = Recorder::default();

        transport.process_events(Duration::from_millis(100), &mut recorder).unwrap();
        transport.process_events(Duration::from_millis(10), &mut recorder).unwrap();

        assert_eq!(
            transport.budgets(),
            &[Duration::from_millis(100), Duration::from_millis(10)]
        );
    }
}
