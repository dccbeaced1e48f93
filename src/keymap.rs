//! The PCjr scancode table.
//!
//! The PCjr keyboard has 62 keys and no function row; F1-F10 and a few
//! other missing keys live on a second layer reached by holding the Fn key
//! (scancode 0x54).  Each table row carries the base usage, the layered
//! usage, and any modifier that has to be asserted along with it (some
//! layered symbols are shifted characters on a modern keyboard).

use bitflags::bitflags;
use usbd_human_interface_device::page::Keyboard;

bitflags! {
    /// HID modifier byte, one bit per modifier key.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Mods: u8 {
        const LEFT_CTRL = 0x01;
        const LEFT_SHIFT = 0x02;
        const LEFT_ALT = 0x04;
        /// No PCjr key maps to a GUI key; the table uses this bit to mark
        /// the function layer latch.
        const LEFT_GUI = 0x08;
        const RIGHT_CTRL = 0x10;
        const RIGHT_SHIFT = 0x20;
        const RIGHT_ALT = 0x40;
        const RIGHT_GUI = 0x80;
    }
}

/// One row of the scancode table.
pub struct KeyEntry {
    /// Usage sent while the function layer is off.
    pub base: Keyboard,
    /// Usage sent while the function layer is on.
    pub fn_key: Keyboard,
    /// Extra modifiers asserted along with `fn_key`.
    pub fn_mods: Mods,
    /// Nonempty when this scancode is itself a modifier key.
    pub mods: Mods,
}

/// An unassigned scancode.
const NONE: KeyEntry = KeyEntry {
    base: Keyboard::NoEventIndicated,
    fn_key: Keyboard::NoEventIndicated,
    fn_mods: Mods::empty(),
    mods: Mods::empty(),
};

/// A key with no function layer mapping.
const fn k(base: Keyboard) -> KeyEntry {
    KeyEntry {
        base,
        fn_key: Keyboard::NoEventIndicated,
        fn_mods: Mods::empty(),
        mods: Mods::empty(),
    }
}

/// A key with a function layer mapping.
const fn f(base: Keyboard, fn_key: Keyboard) -> KeyEntry {
    KeyEntry {
        base,
        fn_key,
        fn_mods: Mods::empty(),
        mods: Mods::empty(),
    }
}

/// A key whose function layer mapping is a shifted character.
const fn fs(base: Keyboard, fn_key: Keyboard) -> KeyEntry {
    KeyEntry {
        base,
        fn_key,
        fn_mods: Mods::LEFT_SHIFT,
        mods: Mods::empty(),
    }
}

/// A modifier key.
const fn m(mods: Mods) -> KeyEntry {
    KeyEntry {
        base: Keyboard::NoEventIndicated,
        fn_key: Keyboard::NoEventIndicated,
        fn_mods: Mods::empty(),
        mods,
    }
}

/// Scancode to HID usage table, indexed directly by the raw code.
pub static PCJR_TO_HID: [KeyEntry; 0x55] = [
    NONE,                                               // 0x00
    k(Keyboard::Escape),                                // 0x01
    f(Keyboard::Keyboard1, Keyboard::F1),               // 0x02
    f(Keyboard::Keyboard2, Keyboard::F2),               // 0x03
    f(Keyboard::Keyboard3, Keyboard::F3),               // 0x04
    f(Keyboard::Keyboard4, Keyboard::F4),               // 0x05
    f(Keyboard::Keyboard5, Keyboard::F5),               // 0x06
    f(Keyboard::Keyboard6, Keyboard::F6),               // 0x07
    f(Keyboard::Keyboard7, Keyboard::F7),               // 0x08
    f(Keyboard::Keyboard8, Keyboard::F8),               // 0x09
    f(Keyboard::Keyboard9, Keyboard::F9),               // 0x0a
    f(Keyboard::Keyboard0, Keyboard::F10),              // 0x0b
    k(Keyboard::Minus),                                 // 0x0c
    k(Keyboard::Equal),                                 // 0x0d
    k(Keyboard::DeleteBackspace),                       // 0x0e
    k(Keyboard::Tab),                                   // 0x0f
    f(Keyboard::Q, Keyboard::Pause),                    // 0x10
    k(Keyboard::W),                                     // 0x11
    k(Keyboard::E),                                     // 0x12
    k(Keyboard::R),                                     // 0x13
    k(Keyboard::T),                                     // 0x14
    k(Keyboard::Y),                                     // 0x15
    k(Keyboard::U),                                     // 0x16
    k(Keyboard::I),                                     // 0x17
    k(Keyboard::O),                                     // 0x18
    f(Keyboard::P, Keyboard::PrintScreen),              // 0x19
    fs(Keyboard::LeftBrace, Keyboard::Backslash),       // 0x1a, Fn gives |
    fs(Keyboard::RightBrace, Keyboard::Grave),          // 0x1b, Fn gives ~
    k(Keyboard::ReturnEnter),                           // 0x1c
    m(Mods::LEFT_CTRL),                                 // 0x1d
    k(Keyboard::A),                                     // 0x1e
    f(Keyboard::S, Keyboard::ScrollLock),               // 0x1f
    k(Keyboard::D),                                     // 0x20
    k(Keyboard::F),                                     // 0x21
    k(Keyboard::G),                                     // 0x22
    k(Keyboard::H),                                     // 0x23
    k(Keyboard::J),                                     // 0x24
    k(Keyboard::K),                                     // 0x25
    k(Keyboard::L),                                     // 0x26
    k(Keyboard::Semicolon),                             // 0x27
    f(Keyboard::Apostrophe, Keyboard::Grave),           // 0x28, Fn gives backquote
    NONE,                                               // 0x29
    m(Mods::LEFT_SHIFT),                                // 0x2a
    NONE,                                               // 0x2b
    k(Keyboard::Z),                                     // 0x2c
    k(Keyboard::X),                                     // 0x2d
    k(Keyboard::C),                                     // 0x2e
    k(Keyboard::V),                                     // 0x2f
    k(Keyboard::B),                                     // 0x30
    k(Keyboard::N),                                     // 0x31
    k(Keyboard::M),                                     // 0x32
    k(Keyboard::Comma),                                 // 0x33
    k(Keyboard::Dot),                                   // 0x34
    f(Keyboard::ForwardSlash, Keyboard::Backslash),     // 0x35
    m(Mods::RIGHT_SHIFT),                               // 0x36
    NONE,                                               // 0x37
    m(Mods::LEFT_ALT),                                  // 0x38
    k(Keyboard::Space),                                 // 0x39
    k(Keyboard::CapsLock),                              // 0x3a
    NONE,                                               // 0x3b
    NONE,                                               // 0x3c
    NONE,                                               // 0x3d
    NONE,                                               // 0x3e
    NONE,                                               // 0x3f
    NONE,                                               // 0x40
    NONE,                                               // 0x41
    NONE,                                               // 0x42
    NONE,                                               // 0x43
    NONE,                                               // 0x44
    NONE,                                               // 0x45
    NONE,                                               // 0x46
    NONE,                                               // 0x47
    f(Keyboard::UpArrow, Keyboard::Home),               // 0x48
    NONE,                                               // 0x49
    NONE,                                               // 0x4a
    f(Keyboard::LeftArrow, Keyboard::PageUp),           // 0x4b
    NONE,                                               // 0x4c
    f(Keyboard::RightArrow, Keyboard::PageDown),        // 0x4d
    NONE,                                               // 0x4e
    NONE,                                               // 0x4f
    f(Keyboard::DownArrow, Keyboard::End),              // 0x50
    NONE,                                               // 0x51
    k(Keyboard::Insert),                                // 0x52
    k(Keyboard::DeleteForward),                         // 0x53
    m(Mods::LEFT_GUI),                                  // 0x54, the Fn latch
];

/// Look up a scancode.  Codes past the end of the table are unassigned and
/// yield `None`; the bounds check is deliberate, nothing relies on the
/// guard value at the table edge.
pub fn lookup(scancode: u8) -> Option<&'static KeyEntry> {
    PCJR_TO_HID.get(scancode as usize)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_covers_all_scancodes() {
        for code in 0u8..=0x54 {
            assert!(lookup(code).is_some(), "missing entry for {:#04x}", code);
        }
        for code in 0x55u8..=0x7f {
            assert!(lookup(code).is_none(), "unexpected entry for {:#04x}", code);
        }
    }

    /// Every row is either a modifier row or a key row, never both.
    #[test]
    fn entries_are_key_or_modifier() {
        for (code, entry) in PCJR_TO_HID.iter().enumerate() {
            if !entry.mods.is_empty() {
                assert_eq!(
                    entry.base,
                    Keyboard::NoEventIndicated,
                    "modifier row {:#04x} also has a base key",
                    code
                );
                assert_eq!(entry.fn_key, Keyboard::NoEventIndicated);
                assert!(entry.fn_mods.is_empty());
            }
        }
    }

    #[test]
    fn spot_checks() {
        let a = lookup(0x1e).unwrap();
        assert_eq!(a.base, Keyboard::A);
        assert_eq!(a.fn_key, Keyboard::NoEventIndicated);

        let one = lookup(0x02).unwrap();
        assert_eq!(one.base, Keyboard::Keyboard1);
        assert_eq!(one.fn_key, Keyboard::F1);
        assert!(one.fn_mods.is_empty());

        // Fn + [ is |, which needs a shift.
        let brace = lookup(0x1a).unwrap();
        assert_eq!(brace.fn_key, Keyboard::Backslash);
        assert_eq!(brace.fn_mods, Mods::LEFT_SHIFT);

        assert_eq!(lookup(0x2a).unwrap().mods, Mods::LEFT_SHIFT);
        assert_eq!(lookup(0x36).unwrap().mods, Mods::RIGHT_SHIFT);
        assert_eq!(lookup(0x54).unwrap().mods, Mods::LEFT_GUI);
    }
}
