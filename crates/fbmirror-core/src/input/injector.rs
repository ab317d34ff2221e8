//! InputInjector: turns remote key and pointer callbacks into input events.
//!
//! The injector owns the keyboard and touch sinks (either may be absent if
//! its device failed to open), the debounce state, the touch session and
//! the tracking-id counter shared by touches and gestures.  It consults the
//! [`AuthorizationTable`] read-only for every callback.
//!
//! # Keyboard path
//!
//! 1. Clients below `Operate` are ignored.
//! 2. The system-menu key is gated on `Admin`: it injects the alternate
//!    code with an `MSC_SCAN` record, and on the soft-buttons variant also
//!    plays the system-menu gesture.  Non-admin presses are discarded.
//! 3. While an Admin holds the system-menu key, F1–F4 play the button
//!    gestures instead of their scan codes.
//! 4. Any other symbol is translated through the key table, debounced, and
//!    written as `key, SYN`.
//!
//! # Pointer path
//!
//! Delegated to [`TouchState`]; the injector only checks rights and writes
//! the resulting sequence.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::event::{write_sequence, InputEvent, InputSink};
use super::gesture::Gesture;
use super::keyboard::{DebounceConfig, KeyDecision, KeyRepeatState};
use super::touch::{PointerAction, TouchBounds, TouchState, TrackingIds};
use crate::domain::auth::{AuthorizationTable, ClientId};
use crate::keymap::{self, SYSTEM_MENU_CODE, SYSTEM_MENU_KEYSYM, SYSTEM_MENU_SCAN};

/// Hardware variant of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceVariant {
    /// Physical buttons present.
    #[default]
    Standard,
    /// Buttons are drawn on the touch panel; the system-menu key also
    /// plays the system-menu gesture.
    SoftButtons,
}

/// Injector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectorConfig {
    pub debounce: DebounceConfig,
    pub touch_bounds: TouchBounds,
    pub variant: DeviceVariant,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::default(),
            touch_bounds: TouchBounds::for_display(800, 600),
            variant: DeviceVariant::Standard,
        }
    }
}

/// Why a callback produced no injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The client is unknown or view-only, or lacks Admin for a gated key.
    NotPermitted,
    /// The symbol has no scan code.
    Unmapped,
    /// The device for this path is not open.
    NoDevice,
    /// A repeat inside the debounce window.
    Coalesced,
    /// An up event for a key already up.
    DuplicateUp,
    /// Release of a chord key whose gesture already played on press.
    ChordRelease,
}

/// Result of one keyboard callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Injected { code: u16, refresh: bool },
    SystemMenu { refresh: bool },
    Gesture { gesture: Gesture, refresh: bool },
    Dropped(DropReason),
}

impl KeyOutcome {
    /// `true` when the caller should re-diff the display now.
    pub fn wants_refresh(&self) -> bool {
        matches!(
            self,
            Self::Injected { refresh: true, .. }
                | Self::SystemMenu { refresh: true }
                | Self::Gesture { refresh: true, .. }
        )
    }
}

/// Result of one pointer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    Handled(PointerAction),
    Dropped(DropReason),
}

/// Synthetic input emitter for one panel.
pub struct InputInjector {
    keyboard: Option<Arc<dyn InputSink>>,
    touch_sink: Option<Arc<dyn InputSink>>,
    repeat: KeyRepeatState,
    touch: TouchState,
    ids: TrackingIds,
    config: InjectorConfig,
    system_menu_held_by: Option<ClientId>,
}

impl std::fmt::Debug for InputInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputInjector")
            .field("keyboard", &self.keyboard.is_some())
            .field("touch", &self.touch_sink.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl InputInjector {
    /// An injector with no devices attached.
    pub fn new(config: InjectorConfig) -> Self {
        Self {
            keyboard: None,
            touch_sink: None,
            repeat: KeyRepeatState::new(),
            touch: TouchState::new(config.touch_bounds),
            ids: TrackingIds::new(),
            config,
            system_menu_held_by: None,
        }
    }

    pub fn with_keyboard(mut self, sink: Arc<dyn InputSink>) -> Self {
        self.keyboard = Some(sink);
        self
    }

    pub fn with_touch(mut self, sink: Arc<dyn InputSink>) -> Self {
        self.touch_sink = Some(sink);
        self
    }

    pub fn has_keyboard(&self) -> bool {
        self.keyboard.is_some()
    }

    pub fn has_touch(&self) -> bool {
        self.touch_sink.is_some()
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    pub fn repeat_state(&self) -> &KeyRepeatState {
        &self.repeat
    }

    pub fn touch_state(&self) -> &TouchState {
        &self.touch
    }

    /// Handles a keyboard callback received at `at`.
    pub fn key(
        &mut self,
        symbol: u32,
        down: bool,
        client: ClientId,
        auth: &AuthorizationTable,
        at: Instant,
    ) -> KeyOutcome {
        let Some(tier) = auth.rights(client).filter(|t| t.can_operate()) else {
            trace!("key {symbol:#x} from {client} ignored: not permitted");
            return KeyOutcome::Dropped(DropReason::NotPermitted);
        };

        if symbol == SYSTEM_MENU_KEYSYM {
            if !tier.is_admin() {
                debug!("system-menu key from non-admin {client} discarded");
                return KeyOutcome::Dropped(DropReason::NotPermitted);
            }
            return self.system_menu(down, client, at);
        }

        if tier.is_admin() && self.system_menu_held_by == Some(client) {
            if let Some(gesture) = Gesture::for_chord(symbol) {
                let refresh = match self.repeat.on_event(symbol, down, at, &self.config.debounce) {
                    KeyDecision::Pass { refresh } => refresh,
                    KeyDecision::Coalesced => return KeyOutcome::Dropped(DropReason::Coalesced),
                    KeyDecision::DuplicateUp => return KeyOutcome::Dropped(DropReason::DuplicateUp),
                };
                if !down {
                    return KeyOutcome::Dropped(DropReason::ChordRelease);
                }
                self.play_gesture(gesture);
                return KeyOutcome::Gesture { gesture, refresh };
            }
        }

        let Some(code) = keymap::keysym_to_scancode(symbol) else {
            trace!("key {symbol:#x} has no scan code");
            return KeyOutcome::Dropped(DropReason::Unmapped);
        };
        let Some(keyboard) = self.keyboard.as_deref() else {
            return KeyOutcome::Dropped(DropReason::NoDevice);
        };

        let refresh = match self.repeat.on_event(symbol, down, at, &self.config.debounce) {
            KeyDecision::Pass { refresh } => refresh,
            KeyDecision::Coalesced => return KeyOutcome::Dropped(DropReason::Coalesced),
            KeyDecision::DuplicateUp => return KeyOutcome::Dropped(DropReason::DuplicateUp),
        };

        write_sequence(keyboard, &[InputEvent::key(code, down), InputEvent::sync()]);
        debug!("inject key ({code}, {})", down as i32);
        KeyOutcome::Injected { code, refresh }
    }

    fn system_menu(&mut self, down: bool, client: ClientId, at: Instant) -> KeyOutcome {
        let refresh = match self.repeat.on_event(SYSTEM_MENU_KEYSYM, down, at, &self.config.debounce) {
            KeyDecision::Pass { refresh } => refresh,
            KeyDecision::Coalesced => return KeyOutcome::Dropped(DropReason::Coalesced),
            KeyDecision::DuplicateUp => return KeyOutcome::Dropped(DropReason::DuplicateUp),
        };
        self.system_menu_held_by = down.then_some(client);

        if let Some(keyboard) = self.keyboard.as_deref() {
            write_sequence(
                keyboard,
                &[
                    InputEvent::key(SYSTEM_MENU_CODE, down),
                    InputEvent::scan(SYSTEM_MENU_SCAN),
                    InputEvent::sync(),
                ],
            );
        }
        if down && self.config.variant == DeviceVariant::SoftButtons {
            self.play_gesture(Gesture::SystemMenu);
        }
        debug!("inject system-menu key ({SYSTEM_MENU_CODE}, {})", down as i32);
        KeyOutcome::SystemMenu { refresh }
    }

    /// Handles a pointer callback.
    pub fn pointer(
        &mut self,
        button_mask: u8,
        x: i32,
        y: i32,
        client: ClientId,
        auth: &AuthorizationTable,
    ) -> PointerOutcome {
        if !auth.rights(client).is_some_and(|t| t.can_operate()) {
            return PointerOutcome::Dropped(DropReason::NotPermitted);
        }
        let Some(sink) = self.touch_sink.as_deref() else {
            return PointerOutcome::Dropped(DropReason::NoDevice);
        };

        let (action, events) = self.touch.on_pointer(button_mask, x, y, &mut self.ids);
        match action {
            PointerAction::OutOfBounds => trace!("pointer ({x}, {y}) outside touch bounds"),
            PointerAction::Hover => {}
            _ => {
                write_sequence(sink, &events);
                debug!("inject touch {action:?} at ({x}, {y})");
            }
        }
        PointerOutcome::Handled(action)
    }

    /// Plays `gesture` on the touch sink under a fresh tracking id.
    ///
    /// Returns `false` if no touch device is open.
    pub fn play_gesture(&mut self, gesture: Gesture) -> bool {
        let Some(sink) = self.touch_sink.as_deref() else {
            debug!("gesture {gesture:?} skipped: no touch device");
            return false;
        };
        let tracking_id = self.ids.allocate();
        write_sequence(sink, &gesture.events(tracking_id));
        debug!("play gesture {gesture:?} (tracking id {tracking_id})");
        true
    }

    /// Forgets per-client state when `client` disconnects.
    pub fn forget_client(&mut self, client: ClientId) {
        if self.system_menu_held_by == Some(client) {
            self.system_menu_held_by = None;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::domain::auth::RightsTier;
    use crate::input::mock::MockInputSink;
    use crate::keymap::{evdev, keysym};

    struct Rig {
        injector: InputInjector,
        keyboard: Arc<MockInputSink>,
        touch: Arc<MockInputSink>,
        auth: AuthorizationTable,
    }

    fn rig(variant: DeviceVariant) -> Rig {
        let keyboard = Arc::new(MockInputSink::new());
        let touch = Arc::new(MockInputSink::new());
        let config = InjectorConfig {
            variant,
            ..InjectorConfig::default()
        };
        let injector = InputInjector::new(config)
            .with_keyboard(Arc::clone(&keyboard) as Arc<dyn InputSink>)
            .with_touch(Arc::clone(&touch) as Arc<dyn InputSink>);
        Rig {
            injector,
            keyboard,
            touch,
            auth: AuthorizationTable::default(),
        }
    }

    fn client(rig: &mut Rig, tier: RightsTier) -> ClientId {
        let id = Uuid::new_v4();
        rig.auth.admit(id, tier).unwrap();
        id
    }

    #[test]
    fn test_mapped_key_injects_key_then_sync() {
        // Arrange
        let mut rig = rig(DeviceVariant::Standard);
        let c = client(&mut rig, RightsTier::Operate);

        // Act
        let outcome = rig.injector.key(keysym::XK_RETURN, true, c, &rig.auth, Instant::now());

        // Assert
        assert_eq!(outcome, KeyOutcome::Injected { code: evdev::KEY_ENTER, refresh: false });
        assert_eq!(
            rig.keyboard.recorded(),
            vec![InputEvent::key(evdev::KEY_ENTER, true), InputEvent::sync()]
        );
    }

    #[test]
    fn test_unmapped_key_is_dropped_without_injection() {
        let mut rig = rig(DeviceVariant::Standard);
        let c = client(&mut rig, RightsTier::Operate);

        let outcome = rig.injector.key(0x0061, true, c, &rig.auth, Instant::now());

        assert_eq!(outcome, KeyOutcome::Dropped(DropReason::Unmapped));
        assert!(rig.keyboard.recorded().is_empty());
    }

    #[test]
    fn test_view_only_and_unknown_clients_inject_nothing() {
        let mut rig = rig(DeviceVariant::Standard);
        let viewer = client(&mut rig, RightsTier::ViewOnly);
        let stranger = Uuid::new_v4();
        let now = Instant::now();

        let a = rig.injector.key(keysym::XK_UP, true, viewer, &rig.auth, now);
        let b = rig.injector.key(keysym::XK_UP, true, stranger, &rig.auth, now);
        let c = rig.injector.pointer(1, 10, 10, viewer, &rig.auth);

        assert_eq!(a, KeyOutcome::Dropped(DropReason::NotPermitted));
        assert_eq!(b, KeyOutcome::Dropped(DropReason::NotPermitted));
        assert_eq!(c, PointerOutcome::Dropped(DropReason::NotPermitted));
        assert!(rig.keyboard.recorded().is_empty());
        assert!(rig.touch.recorded().is_empty());
    }

    #[test]
    fn test_admin_system_menu_emits_extended_sequence() {
        // Arrange
        let mut rig = rig(DeviceVariant::Standard);
        let admin = client(&mut rig, RightsTier::Admin);

        // Act
        let outcome = rig.injector.key(SYSTEM_MENU_KEYSYM, true, admin, &rig.auth, Instant::now());

        // Assert
        assert_eq!(outcome, KeyOutcome::SystemMenu { refresh: false });
        assert_eq!(
            rig.keyboard.recorded(),
            vec![
                InputEvent::key(106, true),
                InputEvent::scan(0x8B),
                InputEvent::sync(),
            ]
        );
        assert!(rig.touch.recorded().is_empty());
    }

    #[test]
    fn test_non_admin_system_menu_is_silently_discarded() {
        let mut rig = rig(DeviceVariant::SoftButtons);
        let operator = client(&mut rig, RightsTier::Operate);

        let outcome = rig.injector.key(SYSTEM_MENU_KEYSYM, true, operator, &rig.auth, Instant::now());

        assert_eq!(outcome, KeyOutcome::Dropped(DropReason::NotPermitted));
        assert!(rig.keyboard.recorded().is_empty());
        assert!(rig.touch.recorded().is_empty());
    }

    #[test]
    fn test_soft_buttons_variant_also_plays_system_menu_gesture() {
        let mut rig = rig(DeviceVariant::SoftButtons);
        let admin = client(&mut rig, RightsTier::Admin);

        rig.injector.key(SYSTEM_MENU_KEYSYM, true, admin, &rig.auth, Instant::now());

        assert_eq!(rig.touch.recorded(), Gesture::SystemMenu.events(0));
    }

    #[test]
    fn test_chord_plays_gesture_instead_of_scan_code() {
        // Arrange
        let mut rig = rig(DeviceVariant::Standard);
        let admin = client(&mut rig, RightsTier::Admin);
        let t0 = Instant::now();
        rig.injector.key(SYSTEM_MENU_KEYSYM, true, admin, &rig.auth, t0);
        rig.keyboard.clear();

        // Act
        let down = rig.injector.key(keysym::XK_F2, true, admin, &rig.auth, t0 + Duration::from_millis(200));
        let up = rig.injector.key(keysym::XK_F2, false, admin, &rig.auth, t0 + Duration::from_millis(300));

        // Assert
        assert_eq!(down, KeyOutcome::Gesture { gesture: Gesture::Home, refresh: false });
        assert_eq!(up, KeyOutcome::Dropped(DropReason::ChordRelease));
        assert!(rig.keyboard.recorded().is_empty());
        assert_eq!(rig.touch.recorded(), Gesture::Home.events(0));
    }

    #[test]
    fn test_held_chord_key_is_debounced() {
        // Arrange
        let mut rig = rig(DeviceVariant::Standard);
        let admin = client(&mut rig, RightsTier::Admin);
        let t0 = Instant::now();
        rig.injector.key(SYSTEM_MENU_KEYSYM, true, admin, &rig.auth, t0);

        // Act: twelve auto-repeated F2 downs, 20 ms apart.
        let outcomes: Vec<_> = (1..=12)
            .map(|i| {
                let at = t0 + Duration::from_millis(200 + 20 * i);
                rig.injector.key(keysym::XK_F2, true, admin, &rig.auth, at)
            })
            .collect();

        // Assert: the first press plays, the tenth coalesced repeat replays
        // with a refresh, everything else is dropped.
        assert_eq!(outcomes[0], KeyOutcome::Gesture { gesture: Gesture::Home, refresh: false });
        assert_eq!(outcomes[10], KeyOutcome::Gesture { gesture: Gesture::Home, refresh: true });
        let played = outcomes
            .iter()
            .filter(|o| matches!(o, KeyOutcome::Gesture { .. }))
            .count();
        assert_eq!(played, 2);
        assert_eq!(
            rig.touch.recorded(),
            [Gesture::Home.events(0), Gesture::Home.events(1)].concat()
        );
    }

    #[test]
    fn test_function_key_after_system_menu_release_is_plain() {
        let mut rig = rig(DeviceVariant::Standard);
        let admin = client(&mut rig, RightsTier::Admin);
        let t0 = Instant::now();
        rig.injector.key(SYSTEM_MENU_KEYSYM, true, admin, &rig.auth, t0);
        rig.injector.key(SYSTEM_MENU_KEYSYM, false, admin, &rig.auth, t0 + Duration::from_millis(50));

        let outcome = rig.injector.key(keysym::XK_F2, true, admin, &rig.auth, t0 + Duration::from_millis(60));

        assert_eq!(outcome, KeyOutcome::Injected { code: evdev::KEY_F2, refresh: false });
    }

    #[test]
    fn test_held_key_refreshes_on_tenth_repeat() {
        let mut rig = rig(DeviceVariant::Standard);
        let c = client(&mut rig, RightsTier::Operate);
        let t0 = Instant::now();
        rig.injector.key(keysym::XK_DOWN, true, c, &rig.auth, t0);

        let outcomes: Vec<_> = (1..=12u64)
            .map(|i| rig.injector.key(keysym::XK_DOWN, true, c, &rig.auth, t0 + Duration::from_millis(30 * i)))
            .collect();

        let refreshes = outcomes.iter().filter(|o| o.wants_refresh()).count();
        assert_eq!(refreshes, 1);
        assert!(outcomes[9].wants_refresh());
        // Initial press plus the tenth repeat, each key + sync.
        assert_eq!(rig.keyboard.recorded().len(), 4);
    }

    #[test]
    fn test_missing_keyboard_reports_no_device() {
        let mut injector = InputInjector::new(InjectorConfig::default());
        let mut auth = AuthorizationTable::default();
        let c = Uuid::new_v4();
        auth.admit(c, RightsTier::Operate).unwrap();

        let outcome = injector.key(keysym::XK_LEFT, true, c, &auth, Instant::now());

        assert_eq!(outcome, KeyOutcome::Dropped(DropReason::NoDevice));
    }

    #[test]
    fn test_gestures_and_touches_share_tracking_ids() {
        let mut rig = rig(DeviceVariant::Standard);
        let c = client(&mut rig, RightsTier::Operate);

        rig.injector.play_gesture(Gesture::Info);
        let outcome = rig.injector.pointer(1, 100, 100, c, &rig.auth);

        assert_eq!(outcome, PointerOutcome::Handled(PointerAction::Press { tracking_id: 1 }));
    }

    #[test]
    fn test_pointer_write_failure_keeps_session_running() {
        let failing = Arc::new(MockInputSink::failing());
        let mut injector = InputInjector::new(InjectorConfig::default())
            .with_touch(Arc::clone(&failing) as Arc<dyn InputSink>);
        let mut auth = AuthorizationTable::default();
        let c = Uuid::new_v4();
        auth.admit(c, RightsTier::Operate).unwrap();

        let press = injector.pointer(1, 10, 10, c, &auth);
        let release = injector.pointer(0, 10, 10, c, &auth);

        assert_eq!(press, PointerOutcome::Handled(PointerAction::Press { tracking_id: 0 }));
        assert_eq!(release, PointerOutcome::Handled(PointerAction::Release));
    }

    #[test]
    fn test_forget_client_ends_chord() {
        let mut rig = rig(DeviceVariant::Standard);
        let admin = client(&mut rig, RightsTier::Admin);
        let t0 = Instant::now();
        rig.injector.key(SYSTEM_MENU_KEYSYM, true, admin, &rig.auth, t0);

        rig.injector.forget_client(admin);
        let outcome = rig.injector.key(keysym::XK_F1, true, admin, &rig.auth, t0 + Duration::from_millis(500));

        assert_eq!(outcome, KeyOutcome::Injected { code: evdev::KEY_F1, refresh: false });
    }
}
