//! Scancode translation and key state.
//!
//! Takes decoded frames and folds them into the state a HID keyboard
//! report is built from: up to six held keys, the modifier mask, and the
//! function layer latch.  Every frame leaves the state well defined;
//! unassigned scancodes and overfull rosters are consumed without effect.

use arrayvec::ArrayVec;
use usbd_human_interface_device::page::Keyboard;

use crate::keymap::{self, KeyEntry, Mods};
use crate::log::warn;
use crate::sampler::Frame;

/// Regular key slots in a boot keyboard report.
pub const REPORT_SLOTS: usize = 6;

/// Everything that goes in one report: modifier usages then held keys.
pub type Report = ArrayVec<Keyboard, 14>;

/// The set of currently held keys and modifiers.
pub struct KeyboardState {
    /// Held keys, one report slot each.  Slots are claimed first-free on
    /// press and reused after release, so the report order is press order.
    held: [Keyboard; REPORT_SLOTS],
    /// Currently asserted modifiers.
    mods: Mods,
    /// Function layer accumulator.  Empty while the layer is off; holds
    /// the latch marker plus any layered-key modifiers picked up while it
    /// is on.
    layer: Mods,
}

impl Default for KeyboardState {
    fn default() -> Self {
        KeyboardState::new()
    }
}

impl KeyboardState {
    pub fn new() -> KeyboardState {
        KeyboardState {
            held: [Keyboard::NoEventIndicated; REPORT_SLOTS],
            mods: Mods::empty(),
            layer: Mods::empty(),
        }
    }

    pub fn modifiers(&self) -> Mods {
        self.mods
    }

    pub fn layer_active(&self) -> bool {
        !self.layer.is_empty()
    }

    /// Apply one decoded frame.
    pub fn handle_frame(&mut self, frame: Frame) {
        let entry = match keymap::lookup(frame.scancode) {
            Some(entry) => entry,
            None => return,
        };

        if entry.mods == Mods::LEFT_GUI {
            // The function layer latch.
            if frame.release {
                // Unconditional: drop the layer and whatever modifiers it
                // pushed into the mask, even if a layered key is still
                // physically down.
                self.mods &= !(self.layer & !Mods::LEFT_GUI);
                self.layer = Mods::empty();
            } else {
                // A fresh press restarts the layer from scratch.
                self.layer = Mods::LEFT_GUI;
            }
        } else if !entry.mods.is_empty() {
            if frame.release {
                self.mods &= !entry.mods;
            } else {
                self.mods |= entry.mods;
            }
        } else if frame.release {
            self.release_key(entry);
        } else {
            self.press_key(entry);
        }
    }

    fn press_key(&mut self, entry: &KeyEntry) {
        let key = if self.layer.contains(Mods::LEFT_GUI) {
            self.layer |= entry.fn_mods;
            self.mods |= self.layer & !Mods::LEFT_GUI;
            entry.fn_key
        } else {
            entry.base
        };
        if key == Keyboard::NoEventIndicated {
            return;
        }
        if self.held.contains(&key) {
            // Already held; never claim a second slot.
            return;
        }
        match self
            .held
            .iter_mut()
            .find(|slot| **slot == Keyboard::NoEventIndicated)
        {
            Some(slot) => *slot = key,
            None => warn!("all six key slots in use, dropping press"),
        }
    }

    fn release_key(&mut self, entry: &KeyEntry) {
        let key = if self.layer.is_empty() {
            entry.base
        } else {
            self.mods &= !(self.layer & !Mods::LEFT_GUI);
            entry.fn_key
        };
        if key == Keyboard::NoEventIndicated {
            return;
        }
        if let Some(slot) = self.held.iter_mut().find(|slot| **slot == key) {
            *slot = Keyboard::NoEventIndicated;
        }
    }

    /// The standard 8 byte boot report: modifiers, reserved, six keys.
    pub fn boot_report(&self) -> [u8; 8] {
        let mut report = [0u8; 8];
        report[0] = self.mods.bits();
        for (byte, slot) in report[2..].iter_mut().zip(self.held.iter()) {
            *byte = *slot as u8;
        }
        report
    }

    /// Keys for the HID class: modifier usages (0xe0 up) followed by the
    /// held keys.
    pub fn report(&self) -> Report {
        // Modifier usages, in bit order of the mask.
        static MOD_USAGES: [Keyboard; 8] = [
            Keyboard::LeftControl,
            Keyboard::LeftShift,
            Keyboard::LeftAlt,
            Keyboard::LeftGUI,
            Keyboard::RightControl,
            Keyboard::RightShift,
            Keyboard::RightAlt,
            Keyboard::RightGUI,
        ];

        let mut keys = Report::new();
        let mods = self.mods.bits();
        for (bit, key) in MOD_USAGES.iter().enumerate() {
            if mods & (1 << bit) != 0 {
                keys.push(*key);
            }
        }
        for slot in self.held.iter() {
            if *slot != Keyboard::NoEventIndicated {
                keys.push(*slot);
            }
        }
        keys
    }
}
