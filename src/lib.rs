//! IBM PCjr keyboard to USB HID bridge, protocol core.
//!
//! The PCjr keyboard talks over a single self-clocked serial line, one
//! nine-bit frame per key press or release.  This crate decodes that wire
//! format and turns it into HID keyboard state: [`sampler`] rebuilds frames
//! from the line, [`keymap`] holds the scancode table, and [`translator`]
//! tracks held keys and modifiers and assembles reports.  Hardware access
//! goes through `embedded-hal` traits, so the whole crate also runs on the
//! host for testing.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub use keymap::{KeyEntry, Mods};
pub use sampler::{Frame, FrameDecoder, LineSampler};
pub use translator::{KeyboardState, Report};

pub mod keymap;
pub mod sampler;
pub mod translator;

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        pub(crate) mod log {
            pub use defmt::{info, warn};
        }
    } else if #[cfg(feature = "log")] {
        pub(crate) mod log {
            pub use log::{info, warn};
        }
    } else {
        pub(crate) mod log {
            macro_rules! info {
                ($($arg:tt)*) => {{}};
            }
            macro_rules! warn {
                ($($arg:tt)*) => {{}};
            }
            pub(crate) use {info, warn};
        }
    }
}
