//! End to end tests for the bridge core.
//!
//! Each test is a script of key events fed through the translator, with
//! boot report checks interleaved, the way the host would see the traffic.
//! The last test runs real wire frames through the sampler first.

use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::VecDeque;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::InputPin;

use pcjr_keyboard::sampler::LineSampler;
use pcjr_keyboard::translator::KeyboardState;
use pcjr_keyboard::Frame;

/// Scancodes used in the scripts.
const SC_A: u8 = 0x1e;
const SC_W: u8 = 0x11;
const SC_E: u8 = 0x12;
const SC_R: u8 = 0x13;
const SC_T: u8 = 0x14;
const SC_Y: u8 = 0x15;
const SC_U: u8 = 0x16;
const SC_ONE: u8 = 0x02;
const SC_LBRACKET: u8 = 0x1a;
const SC_LSHIFT: u8 = 0x2a;
const SC_FN: u8 = 0x54;

/// HID usage values the reports should carry.
const KEY_A: u8 = 0x04;
const KEY_F1: u8 = 0x3a;
const KEY_BACKSLASH: u8 = 0x31;
const SHIFT_BIT: u8 = 0x02;

enum Step {
    Press(u8),
    Release(u8),
    /// Expected boot report after the steps so far.
    Expect([u8; 8]),
}

use Step::*;

fn run(steps: &[Step]) {
    let mut state = KeyboardState::new();
    for (i, step) in steps.iter().enumerate() {
        match step {
            Press(scancode) => state.handle_frame(Frame {
                scancode: *scancode,
                release: false,
            }),
            Release(scancode) => state.handle_frame(Frame {
                scancode: *scancode,
                release: true,
            }),
            Expect(report) => {
                assert_eq!(&state.boot_report(), report, "at step {}", i);
            }
        }
    }
}

#[test]
fn plain_key() {
    run(&[
        Press(SC_A),
        Expect([0, 0, KEY_A, 0, 0, 0, 0, 0]),
        Release(SC_A),
        Expect([0; 8]),
    ]);
}

#[test]
fn shifted_key() {
    run(&[
        Press(SC_LSHIFT),
        Expect([SHIFT_BIT, 0, 0, 0, 0, 0, 0, 0]),
        Press(SC_A),
        Expect([SHIFT_BIT, 0, KEY_A, 0, 0, 0, 0, 0]),
        Release(SC_A),
        Release(SC_LSHIFT),
        Expect([0; 8]),
    ]);
}

#[test]
fn function_layer_key() {
    run(&[
        Press(SC_FN),
        Expect([0; 8]),
        Press(SC_ONE),
        Expect([0, 0, KEY_F1, 0, 0, 0, 0, 0]),
        Release(SC_ONE),
        Release(SC_FN),
        Expect([0; 8]),
    ]);
}

#[test]
fn function_layer_shifted_symbol() {
    run(&[
        Press(SC_FN),
        // Fn + [ is |, an implied-shift symbol.
        Press(SC_LBRACKET),
        Expect([SHIFT_BIT, 0, KEY_BACKSLASH, 0, 0, 0, 0, 0]),
        // Dropping the latch removes the implied shift even though the
        // symbol key is still down.
        Release(SC_FN),
        Expect([0, 0, KEY_BACKSLASH, 0, 0, 0, 0, 0]),
    ]);
}

#[test]
fn repeated_press_holds_one_slot() {
    run(&[
        Press(SC_A),
        Press(SC_A),
        Expect([0, 0, KEY_A, 0, 0, 0, 0, 0]),
        Release(SC_A),
        Expect([0; 8]),
    ]);
}

#[test]
fn seventh_key_is_dropped() {
    run(&[
        Press(SC_A),
        Press(SC_W),
        Press(SC_E),
        Press(SC_R),
        Press(SC_T),
        Press(SC_Y),
        // All six slots are taken; this press goes nowhere.
        Press(SC_U),
        Expect([0, 0, 0x04, 0x1a, 0x08, 0x15, 0x17, 0x1c]),
        // Releasing the dropped key is a harmless no-op.
        Release(SC_U),
        Expect([0, 0, 0x04, 0x1a, 0x08, 0x15, 0x17, 0x1c]),
        Release(SC_T),
        Expect([0, 0, 0x04, 0x1a, 0x08, 0x15, 0, 0x1c]),
    ]);
}

#[test]
fn out_of_range_scancodes_change_nothing() {
    run(&[
        Press(0x55),
        Press(0x7f),
        Release(0x60),
        Expect([0; 8]),
    ]);
}

// Wire-level path: sampler into translator.

struct FakeLine {
    // true = line low.
    levels: RefCell<VecDeque<bool>>,
}

impl InputPin for FakeLine {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(self
            .levels
            .borrow_mut()
            .pop_front()
            .expect("line read past end of script"))
    }
}

struct NoDelay;

impl DelayUs<u32> for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

/// Line levels for one frame: the start-edge read plus nine bit cells
/// with the given parity bit.
fn wire_frame(data: u8, parity: u16) -> Vec<bool> {
    let accum = data as u16 | (parity << 8);
    let mut levels = vec![true];
    levels.extend((0..9).map(|bit| accum & (1 << bit) != 0));
    levels
}

#[test]
fn wire_to_report() {
    let mut levels = wire_frame(SC_A, 0); // "A" press; 0x1e has even popcount
    levels.extend(wire_frame(0x80 | SC_A, 1)); // and its release
    let line = FakeLine {
        levels: RefCell::new(levels.into_iter().collect()),
    };
    let mut sampler = LineSampler::new(line, NoDelay);
    let mut state = KeyboardState::new();

    let frame = sampler.poll().expect("press frame");
    state.handle_frame(frame);
    assert_eq!(state.boot_report(), [0, 0, KEY_A, 0, 0, 0, 0, 0]);

    let frame = sampler.poll().expect("release frame");
    state.handle_frame(frame);
    assert_eq!(state.boot_report(), [0; 8]);
}

#[test]
fn corrupt_wire_frame_is_discarded() {
    // Parity bit claims odd, data popcount is even.
    let levels = wire_frame(SC_A, 1);
    let line = FakeLine {
        levels: RefCell::new(levels.into_iter().collect()),
    };
    let mut sampler = LineSampler::new(line, NoDelay);
    assert!(sampler.poll().is_none());
}
