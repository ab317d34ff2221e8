//! Single-pointer touch session state machine.
//!
//! Remote pointer callbacks arrive as `(button_mask, x, y)`.  Only button 1
//! matters; it is mapped onto one multi-touch contact:
//!
//! | Button 1 | Active session | Action  |
//! |----------|----------------|---------|
//! | down     | no             | press   |
//! | down     | yes            | drag    |
//! | up       | yes            | release |
//! | up       | no             | hover (ignored) |
//!
//! # Event sequences
//!
//! ```text
//! press:   MT_TRACKING_ID(id)  BTN_TOUCH 1  MT_X MT_Y ABS_X ABS_Y  SYN
//! drag:    MT_TRACKING_ID(id)               MT_X MT_Y ABS_X ABS_Y  SYN
//! release: MT_TRACKING_ID(-1)  BTN_TOUCH 0  MT_X MT_Y ABS_X ABS_Y  SYN
//! ```
//!
//! # Jitter
//!
//! The panel firmware drops a sample whose coordinate equals the previous
//! one, which loses drags that pause.  Before emission a coordinate equal
//! to the last emitted value is nudged by one unit, the direction
//! alternating on every call and flipped if the nudge would leave the
//! valid rectangle.

use serde::{Deserialize, Serialize};

use super::event::InputEvent;
use crate::keymap::evdev;

/// Inclusive rectangle of coordinates the touch device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl TouchBounds {
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Bounds covering a `width` x `height` display.
    pub fn for_display(width: u32, height: u32) -> Self {
        Self::new(0, width as i32 - 1, 0, height as i32 - 1)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Source of strictly increasing tracking ids, shared with gestures.
#[derive(Debug, Clone, Default)]
pub struct TrackingIds {
    next: i32,
}

impl TrackingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id; the first is 0.
    pub fn allocate(&mut self) -> i32 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

/// The contact currently held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSession {
    pub tracking_id: i32,
    pub last_x: i32,
    pub last_y: i32,
    pub pressed: bool,
}

/// What a pointer callback turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerAction {
    Press { tracking_id: i32 },
    Drag { tracking_id: i32 },
    Release,
    /// Button up with no contact; nothing is emitted.
    Hover,
    /// Outside the valid rectangle; dropped before any state change.
    OutOfBounds,
}

/// Nudges repeated coordinates so consecutive samples always differ.
#[derive(Debug, Clone)]
struct JitterFilter {
    last: Option<(i32, i32)>,
    sign: i32,
}

impl Default for JitterFilter {
    fn default() -> Self {
        Self { last: None, sign: -1 }
    }
}

impl JitterFilter {
    fn apply(&mut self, x: i32, y: i32, bounds: &TouchBounds) -> (i32, i32) {
        let (last_x, last_y) = self.last.unzip();
        let x = nudge(x, last_x, self.sign, bounds.min_x, bounds.max_x);
        let y = nudge(y, last_y, self.sign, bounds.min_y, bounds.max_y);
        self.last = Some((x, y));
        self.sign = -self.sign;
        (x, y)
    }
}

fn nudge(value: i32, last: Option<i32>, sign: i32, min: i32, max: i32) -> i32 {
    if last != Some(value) {
        return value;
    }
    let moved = value + sign;
    if (min..=max).contains(&moved) {
        moved
    } else {
        value - sign
    }
}

/// Touch path state: the active session and the jitter filter.
#[derive(Debug, Clone)]
pub struct TouchState {
    bounds: TouchBounds,
    session: Option<TouchSession>,
    jitter: JitterFilter,
}

impl TouchState {
    pub fn new(bounds: TouchBounds) -> Self {
        Self {
            bounds,
            session: None,
            jitter: JitterFilter::default(),
        }
    }

    pub fn bounds(&self) -> &TouchBounds {
        &self.bounds
    }

    pub fn session(&self) -> Option<&TouchSession> {
        self.session.as_ref()
    }

    /// Advances the state machine for one pointer callback.
    ///
    /// Returns the action taken and the events to write, in order.
    pub fn on_pointer(
        &mut self,
        button_mask: u8,
        x: i32,
        y: i32,
        ids: &mut TrackingIds,
    ) -> (PointerAction, Vec<InputEvent>) {
        if !self.bounds.contains(x, y) {
            return (PointerAction::OutOfBounds, Vec::new());
        }

        let button_down = button_mask & 1 != 0;
        match (button_down, self.session) {
            (true, None) => {
                let tracking_id = ids.allocate();
                let (x, y) = self.jitter.apply(x, y, &self.bounds);
                self.session = Some(TouchSession {
                    tracking_id,
                    last_x: x,
                    last_y: y,
                    pressed: true,
                });
                let mut events = vec![
                    InputEvent::tracking_id(tracking_id),
                    InputEvent::key(evdev::BTN_TOUCH, true),
                ];
                push_position(&mut events, x, y);
                events.push(InputEvent::sync());
                (PointerAction::Press { tracking_id }, events)
            }
            (true, Some(mut session)) => {
                let (x, y) = self.jitter.apply(x, y, &self.bounds);
                session.last_x = x;
                session.last_y = y;
                self.session = Some(session);
                let mut events = vec![InputEvent::tracking_id(session.tracking_id)];
                push_position(&mut events, x, y);
                events.push(InputEvent::sync());
                (
                    PointerAction::Drag {
                        tracking_id: session.tracking_id,
                    },
                    events,
                )
            }
            (false, Some(_)) => {
                let (x, y) = self.jitter.apply(x, y, &self.bounds);
                self.session = None;
                let mut events = vec![
                    InputEvent::tracking_id(evdev::TRACKING_ID_NONE),
                    InputEvent::key(evdev::BTN_TOUCH, false),
                ];
                push_position(&mut events, x, y);
                events.push(InputEvent::sync());
                (PointerAction::Release, events)
            }
            (false, None) => (PointerAction::Hover, Vec::new()),
        }
    }
}

/// Appends MT and legacy single-touch position events.
pub(crate) fn push_position(events: &mut Vec<InputEvent>, x: i32, y: i32) {
    events.extend([
        InputEvent::abs(evdev::ABS_MT_POSITION_X, x),
        InputEvent::abs(evdev::ABS_MT_POSITION_Y, y),
        InputEvent::abs(evdev::ABS_X, x),
        InputEvent::abs(evdev::ABS_Y, y),
    ]);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
