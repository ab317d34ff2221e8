//! Linux evdev event types and codes used by the injector.
//!
//! Values are those of `linux/input-event-codes.h`.
//!
//! # What is an evdev event? (for beginners)
//!
//! Every key press, touch sample or button on Linux reaches user space as a
//! small fixed-size record `{time, type, code, value}`:
//!
//! | Field   | Example            | Meaning                              |
//! |---------|--------------------|--------------------------------------|
//! | `type`  | `EV_KEY` (1)       | which family of event                |
//! | `code`  | `KEY_ENTER` (28)   | which key / axis inside the family   |
//! | `value` | 1                  | 1 = down, 0 = up, or an axis reading |
//!
//! A group of records is terminated by `EV_SYN / SYN_REPORT`; the kernel
//! (and whatever reads the device) treats everything since the previous
//! report as one atomic update.  Writing records to an input device node
//! injects them exactly as if the hardware had produced them.

// Event types.
pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const EV_MSC: u16 = 0x04;

// EV_SYN codes.
pub const SYN_REPORT: u16 = 0x00;

// EV_MSC codes.
pub const MSC_SCAN: u16 = 0x04;

// EV_ABS codes.
pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

// EV_KEY codes.
pub const KEY_ESC: u16 = 1;
pub const KEY_ENTER: u16 = 28;
pub const KEY_F1: u16 = 59;
pub const KEY_F2: u16 = 60;
pub const KEY_F3: u16 = 61;
pub const KEY_F4: u16 = 62;
pub const KEY_F5: u16 = 63;
pub const KEY_F6: u16 = 64;
pub const KEY_UP: u16 = 103;
pub const KEY_LEFT: u16 = 105;
pub const KEY_RIGHT: u16 = 106;
pub const KEY_DOWN: u16 = 108;
pub const KEY_MENU: u16 = 139;
pub const BTN_TOUCH: u16 = 0x14a;

/// Tracking id value that ends a multi-touch contact.
pub const TRACKING_ID_NONE: i32 = -1;
