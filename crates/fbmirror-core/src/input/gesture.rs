//! Canned gestures that stand in for the panel's physical buttons.
//!
//! Each gesture is data: a key code and the touch points that go with it.
//! One emitter turns any script into the event sequence:
//!
//! ```text
//! MT_TRACKING_ID(++id)  KEY down
//!   for each point:  MT_X MT_Y ABS_X ABS_Y
//! BTN_TOUCH 0  SYN  KEY up  SYN
//! ```
//!
//! Coordinates are those of the button bar on the 800x600 panel.

use super::event::InputEvent;
use super::touch::push_position;
use crate::keymap::{evdev, keysym};

/// A physical button the remote session can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Home,
    Menu,
    Info,
    Start,
    SystemMenu,
}

/// Key code and touch points of one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureScript {
    pub key: u16,
    pub points: &'static [(i32, i32)],
}

const HOME: GestureScript = GestureScript {
    key: evdev::KEY_F2,
    points: &[(85, 535)],
};

const MENU: GestureScript = GestureScript {
    key: evdev::KEY_F4,
    points: &[(300, 535)],
};

const INFO: GestureScript = GestureScript {
    key: evdev::KEY_F1,
    points: &[(515, 535)],
};

const START: GestureScript = GestureScript {
    key: evdev::KEY_F3,
    points: &[(720, 535)],
};

// Swipe along the button bar.
const SYSTEM_MENU: GestureScript = GestureScript {
    key: evdev::KEY_MENU,
    points: &[(300, 535), (515, 535)],
};

impl Gesture {
    pub fn script(self) -> &'static GestureScript {
        match self {
            Self::Home => &HOME,
            Self::Menu => &MENU,
            Self::Info => &INFO,
            Self::Start => &START,
            Self::SystemMenu => &SYSTEM_MENU,
        }
    }

    /// The gesture an Admin triggers with `symbol` while holding the
    /// system-menu key.
    pub fn for_chord(symbol: u32) -> Option<Self> {
        match symbol {
            keysym::XK_F1 => Some(Self::Info),
            keysym::XK_F2 => Some(Self::Home),
            keysym::XK_F3 => Some(Self::Start),
            keysym::XK_F4 => Some(Self::Menu),
            _ => None,
        }
    }

    /// Renders the gesture under `tracking_id`.
    pub fn events(self, tracking_id: i32) -> Vec<InputEvent> {
        let script = self.script();
        let mut events = Vec::with_capacity(6 + 4 * script.points.len());
        events.push(InputEvent::tracking_id(tracking_id));
        events.push(InputEvent::key(script.key, true));
        for &(x, y) in script.points {
            push_position(&mut events, x, y);
        }
        events.push(InputEvent::key(evdev::BTN_TOUCH, false));
        events.push(InputEvent::sync());
        events.push(InputEvent::key(script.key, false));
        events.push(InputEvent::sync());
        events
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_gesture_sequence() {
        let events = Gesture::Home.events(7);

        assert_eq!(
            events,
            vec![
                InputEvent::tracking_id(7),
                InputEvent::key(evdev::KEY_F2, true),
                InputEvent::abs(evdev::ABS_MT_POSITION_X, 85),
                InputEvent::abs(evdev::ABS_MT_POSITION_Y, 535),
                InputEvent::abs(evdev::ABS_X, 85),
                InputEvent::abs(evdev::ABS_Y, 535),
                InputEvent::key(evdev::BTN_TOUCH, false),
                InputEvent::sync(),
                InputEvent::key(evdev::KEY_F2, false),
                InputEvent::sync(),
            ]
        );
    }

    #[test]
    fn test_system_menu_swipes_through_two_points() {
        let events = Gesture::SystemMenu.events(0);

        let xs: Vec<_> = events
            .iter()
            .filter(|e| e.code == evdev::ABS_MT_POSITION_X)
            .map(|e| e.value)
            .collect();
        assert_eq!(xs, vec![300, 515]);
        assert_eq!(events[1], InputEvent::key(evdev::KEY_MENU, true));
        assert_eq!(events.iter().filter(|e| e.is_sync()).count(), 2);
    }

    #[test]
    fn test_every_gesture_ends_with_key_up_and_sync() {
        for g in [Gesture::Home, Gesture::Menu, Gesture::Info, Gesture::Start, Gesture::SystemMenu] {
            let events = g.events(1);
            let n = events.len();
            assert_eq!(events[n - 2], InputEvent::key(g.script().key, false), "{g:?}");
            assert_eq!(events[n - 1], InputEvent::sync(), "{g:?}");
        }
    }

    #[test]
    fn test_chord_mapping() {
        assert_eq!(Gesture::for_chord(keysym::XK_F1), Some(Gesture::Info));
        assert_eq!(Gesture::for_chord(keysym::XK_F2), Some(Gesture::Home));
        assert_eq!(Gesture::for_chord(keysym::XK_F3), Some(Gesture::Start));
        assert_eq!(Gesture::for_chord(keysym::XK_F4), Some(Gesture::Menu));
        assert_eq!(Gesture::for_chord(keysym::XK_F5), None);
    }
}
