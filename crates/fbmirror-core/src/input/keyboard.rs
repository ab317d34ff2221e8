//! Keyboard repeat debounce.
//!
//! Remote viewers send auto-repeat as a stream of down events.  Forwarding
//! every one of them floods the panel, while dropping all of them makes the
//! mirrored display look frozen while a key is held.  The state machine
//! below sits between the two:
//!
//! ```text
//!               down(k), first or outside window
//!   ┌──────┐ ─────────────────────────────────────► ┌────────────┐
//!   │ Idle │                                        │ KeyDown(k) │◄─┐ down(k) within window:
//!   └──────┘ ◄───────────────────────────────────── └────────────┘  │ coalesce, every Nth
//!                          up(k)                          │         │ passes with a refresh
//!                                                         └─────────┘
//! ```
//!
//! The window is measured from the previous down event for the same key,
//! including coalesced ones, so a held key stays coalesced for as long as
//! repeats keep arriving.  An up event for a key that is already up is a
//! duplicate and is dropped.

use std::time::{Duration, Instant};

/// Default window inside which a repeated down event is coalesced.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default period at which coalesced repeats are let through.
pub const DEFAULT_REFRESH_EVERY: u32 = 10;

/// What to do with one keyboard callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecision {
    /// Inject the event.  `refresh` asks the caller to re-diff the display
    /// because the key is being held.
    Pass { refresh: bool },
    /// A repeat inside the debounce window; drop it.
    Coalesced,
    /// An up event for a key that is already up; drop it.
    DuplicateUp,
}

/// Debounce tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub window: Duration,
    pub refresh_every: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_DEBOUNCE,
            refresh_every: DEFAULT_REFRESH_EVERY,
        }
    }
}

/// Last key seen and how many of its repeats have been coalesced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyRepeatState {
    pub last_code: Option<u32>,
    pub last_down: bool,
    pub last_timestamp: Option<Instant>,
    pub coalesce_counter: u32,
}

impl KeyRepeatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a key event for `code` at time `at`, updating the state.
    pub fn on_event(&mut self, code: u32, down: bool, at: Instant, config: &DebounceConfig) -> KeyDecision {
        let same_key = self.last_code == Some(code);

        if !down {
            if same_key && !self.last_down {
                return KeyDecision::DuplicateUp;
            }
            *self = Self {
                last_code: Some(code),
                last_down: false,
                last_timestamp: None,
                coalesce_counter: 0,
            };
            return KeyDecision::Pass { refresh: false };
        }

        let within_window = self
            .last_timestamp
            .is_some_and(|then| at.saturating_duration_since(then) < config.window);

        if same_key && self.last_down && within_window {
            self.last_timestamp = Some(at);
            self.coalesce_counter += 1;
            if self.coalesce_counter >= config.refresh_every {
                self.coalesce_counter = 0;
                return KeyDecision::Pass { refresh: true };
            }
            return KeyDecision::Coalesced;
        }

        *self = Self {
            last_code: Some(code),
            last_down: true,
            last_timestamp: Some(at),
            coalesce_counter: 0,
        };
        KeyDecision::Pass { refresh: false }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: u32 = 0xFF0D;
    const OTHER: u32 = 0xFF1B;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_down_passes() {
        let mut state = KeyRepeatState::new();
        let decision = state.on_event(KEY, true, Instant::now(), &DebounceConfig::default());
        assert_eq!(decision, KeyDecision::Pass { refresh: false });
        assert_eq!(state.last_code, Some(KEY));
        assert!(state.last_down);
    }

    #[test]
    fn test_twelve_rapid_repeats_let_exactly_the_tenth_through() {
        // Arrange
        let config = DebounceConfig::default();
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();
        state.on_event(KEY, true, t0, &config);

        // Act
        let decisions: Vec<_> = (1..=12)
            .map(|i| state.on_event(KEY, true, t0 + ms(20 * i), &config))
            .collect();

        // Assert
        let passed: Vec<_> = decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| matches!(d, KeyDecision::Pass { .. }))
            .map(|(i, d)| (i + 1, *d))
            .collect();
        assert_eq!(passed, vec![(10, KeyDecision::Pass { refresh: true })]);
    }

    #[test]
    fn test_trailing_up_passes_after_coalesced_repeats() {
        let config = DebounceConfig::default();
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();
        state.on_event(KEY, true, t0, &config);
        state.on_event(KEY, true, t0 + ms(30), &config);

        let up = state.on_event(KEY, false, t0 + ms(40), &config);

        assert_eq!(up, KeyDecision::Pass { refresh: false });
        assert_eq!(state.coalesce_counter, 0);
        assert_eq!(state.last_timestamp, None);
    }

    #[test]
    fn test_events_spaced_beyond_window_all_pass() {
        let config = DebounceConfig::default();
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();

        for i in 0..5 {
            let d = state.on_event(KEY, true, t0 + ms(150 * i), &config);
            assert_eq!(d, KeyDecision::Pass { refresh: false }, "event {i}");
        }
    }

    #[test]
    fn test_different_key_inside_window_passes() {
        let config = DebounceConfig::default();
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();
        state.on_event(KEY, true, t0, &config);

        let d = state.on_event(OTHER, true, t0 + ms(5), &config);

        assert_eq!(d, KeyDecision::Pass { refresh: false });
        assert_eq!(state.last_code, Some(OTHER));
    }

    #[test]
    fn test_down_after_up_inside_window_passes() {
        let config = DebounceConfig::default();
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();
        state.on_event(KEY, true, t0, &config);
        state.on_event(KEY, false, t0 + ms(10), &config);

        let d = state.on_event(KEY, true, t0 + ms(20), &config);

        assert_eq!(d, KeyDecision::Pass { refresh: false });
    }

    #[test]
    fn test_duplicate_up_is_dropped() {
        let config = DebounceConfig::default();
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();
        state.on_event(KEY, true, t0, &config);
        state.on_event(KEY, false, t0 + ms(200), &config);

        let d = state.on_event(KEY, false, t0 + ms(400), &config);

        assert_eq!(d, KeyDecision::DuplicateUp);
    }

    #[test]
    fn test_custom_refresh_period() {
        let config = DebounceConfig { window: ms(100), refresh_every: 3 };
        let mut state = KeyRepeatState::new();
        let t0 = Instant::now();
        state.on_event(KEY, true, t0, &config);

        let passes = (1..=9)
            .filter(|i| {
                matches!(
                    state.on_event(KEY, true, t0 + ms(10 * i), &config),
                    KeyDecision::Pass { refresh: true }
                )
            })
            .count();

        assert_eq!(passes, 3);
    }
}
