//! Remote key symbol to hardware scan-code translation.
//!
//! The remote viewer reports keys as X11 KeySyms (see `X11/keysymdef.h`).
//! The panel only has a handful of physical keys, so the table is small:
//! anything not listed here is dropped by the injector without touching a
//! device.
//!
//! | KeySym       | Value  | evdev code     |
//! |--------------|--------|----------------|
//! | `XK_Left`    | 0xFF51 | `KEY_LEFT`     |
//! | `XK_Up`      | 0xFF52 | `KEY_UP`       |
//! | `XK_Right`   | 0xFF53 | `KEY_RIGHT`    |
//! | `XK_Down`    | 0xFF54 | `KEY_DOWN`     |
//! | `XK_Escape`  | 0xFF1B | `KEY_ESC`      |
//! | `XK_Return`  | 0xFF0D | `KEY_ENTER`    |
//! | `XK_F1`–`F6` | 0xFFBE–0xFFC3 | `KEY_F1`–`KEY_F6` |
//!
//! `XK_F10` is not in the table: it is the system-menu key and is handled
//! by the injector's privilege gate instead.

pub mod evdev;

/// KeySym values the injector cares about.
pub mod keysym {
    pub const XK_RETURN: u32 = 0xFF0D;
    pub const XK_ESCAPE: u32 = 0xFF1B;
    pub const XK_LEFT: u32 = 0xFF51;
    pub const XK_UP: u32 = 0xFF52;
    pub const XK_RIGHT: u32 = 0xFF53;
    pub const XK_DOWN: u32 = 0xFF54;
    pub const XK_F1: u32 = 0xFFBE;
    pub const XK_F2: u32 = 0xFFBF;
    pub const XK_F3: u32 = 0xFFC0;
    pub const XK_F4: u32 = 0xFFC1;
    pub const XK_F5: u32 = 0xFFC2;
    pub const XK_F6: u32 = 0xFFC3;
    pub const XK_F10: u32 = 0xFFC7;
}

/// The symbol that opens the device's system menu.
pub const SYSTEM_MENU_KEYSYM: u32 = keysym::XK_F10;

/// Scan code injected for an Admin system-menu press.
pub const SYSTEM_MENU_CODE: u16 = evdev::KEY_RIGHT;

/// `MSC_SCAN` value sent alongside [`SYSTEM_MENU_CODE`].
pub const SYSTEM_MENU_SCAN: i32 = 0x8B;

/// Translates a remote KeySym to an evdev key code.
///
/// Returns `None` for any symbol the panel has no key for.
pub fn keysym_to_scancode(symbol: u32) -> Option<u16> {
    use keysym::*;

    match symbol {
        XK_LEFT => Some(evdev::KEY_LEFT),
        XK_RIGHT => Some(evdev::KEY_RIGHT),
        XK_UP => Some(evdev::KEY_UP),
        XK_DOWN => Some(evdev::KEY_DOWN),
        XK_ESCAPE => Some(evdev::KEY_ESC),
        XK_RETURN => Some(evdev::KEY_ENTER),
        XK_F1 => Some(evdev::KEY_F1),
        XK_F2 => Some(evdev::KEY_F2),
        XK_F3 => Some(evdev::KEY_F3),
        XK_F4 => Some(evdev::KEY_F4),
        XK_F5 => Some(evdev::KEY_F5),
        XK_F6 => Some(evdev::KEY_F6),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_keys_map_to_evdev_codes() {
        assert_eq!(keysym_to_scancode(keysym::XK_LEFT), Some(105));
        assert_eq!(keysym_to_scancode(keysym::XK_RIGHT), Some(106));
        assert_eq!(keysym_to_scancode(keysym::XK_UP), Some(103));
        assert_eq!(keysym_to_scancode(keysym::XK_DOWN), Some(108));
    }

    #[test]
    fn test_escape_and_enter() {
        assert_eq!(keysym_to_scancode(0xFF1B), Some(1));
        assert_eq!(keysym_to_scancode(0xFF0D), Some(28));
    }

    #[test]
    fn test_function_keys_are_contiguous() {
        for (i, sym) in (keysym::XK_F1..=keysym::XK_F6).enumerate() {
            assert_eq!(keysym_to_scancode(sym), Some(evdev::KEY_F1 + i as u16));
        }
    }

    #[test]
    fn test_system_menu_symbol_is_not_translated() {
        assert_eq!(keysym_to_scancode(SYSTEM_MENU_KEYSYM), None);
    }

    #[test]
    fn test_unknown_symbols_return_none() {
        for sym in [0x0061, 0xFFE1, 0xFFC4, 0] {
            assert_eq!(keysym_to_scancode(sym), None, "{sym:#x}");
        }
    }
}
