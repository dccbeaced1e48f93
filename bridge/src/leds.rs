//! Control of the status LED.

use core::iter::once;

use smart_leds::{SmartLedsWrite, RGB8};

const OFF: RGB8 = RGB8::new(0, 0, 0);
const IDLE: RGB8 = RGB8::new(0, 8, 0);
const CAPS: RGB8 = RGB8::new(12, 12, 12);

struct Step {
    color: RGB8,
    count: usize,
}

/// Shown while waiting for the host to configure us.
static LINK_WAIT: &[Step] = &[
    Step { color: RGB8::new(8, 0, 0), count: 100 },
    Step { color: OFF,                count: 300 },
];

pub struct LedManager<L: SmartLedsWrite<Color = RGB8>> {
    leds: L,

    count: usize,
    phase: usize,
    shown: Option<RGB8>,
}

impl<L: SmartLedsWrite<Color = RGB8>> LedManager<L> {
    pub fn new(leds: L) -> Self {
        LedManager {
            leds,
            count: 0,
            phase: 0,
            shown: None,
        }
    }

    /// Advance one 1ms tick.  Blinks the link-wait pattern until the
    /// device is configured, then tracks the host's caps lock state.
    pub fn tick(&mut self, configured: bool, caps_lock: bool) {
        if configured {
            self.count = 0;
            self.phase = 0;
            self.set(if caps_lock { CAPS } else { IDLE });
            return;
        }

        if self.count == 0 {
            if self.phase >= LINK_WAIT.len() {
                self.phase = 0;
            }
            self.set(LINK_WAIT[self.phase].color);
            self.count = LINK_WAIT[self.phase].count;
            self.phase += 1;
        } else {
            self.count -= 1;
        }
    }

    fn set(&mut self, color: RGB8) {
        if self.shown != Some(color) {
            let _ = self.leds.write(once(color));
            self.shown = Some(color);
        }
    }
}
