//! PCjr serial line sampling.
//!
//! The keyboard sends one frame per key event: a low start bit, eight data
//! bits, and a parity bit, at roughly 2270 baud.  There is no clock line;
//! the receiver times itself off the start edge and samples the middle of
//! each bit cell.  The wire is active low, so a low sample contributes a
//! one bit.
//!
//! Decoding is split in two: [`FrameDecoder`] is the pure state machine
//! that turns a series of line samples into a frame, and [`LineSampler`]
//! drives it against a real pin and delay source.

use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::InputPin;

use crate::log::info;

/// Nominal bit time on the wire, in microseconds.
pub const BIT_TIME_US: u32 = 440;

/// Wait from the start edge to the middle of the first data bit: the rest
/// of the start bit plus a quarter bit.
const ALIGN_US: u32 = BIT_TIME_US + BIT_TIME_US / 4;

/// Spacing between successive samples.  A hair under a full bit so the
/// sample point drifts backward rather than off the end of the frame.
const SAMPLE_US: u32 = 439;

/// Bits in a frame: eight data bits and a parity bit.
const FRAME_BITS: u8 = 9;

/// One decoded key event from the wire.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Raw scancode, 0..=0x7f.
    pub scancode: u8,
    /// Set when this is a key release rather than a press.
    pub release: bool,
}

/// Where the decoder is within a frame.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DecodeState {
    /// Waiting for a start edge.
    Idle,
    /// Start edge seen; the next sample is data bit 0.
    Aligning,
    /// Collecting bit samples.
    Sampling { bit: u8, accum: u16 },
}

/// Outcome of feeding one sample to the decoder.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Sampled {
    /// Frame not complete yet, keep sampling.
    More,
    /// A full frame arrived and passed the parity check.
    Complete(Frame),
    /// A full frame arrived but failed the parity check.
    Reject,
}

/// The bit-accumulation state machine, independent of any timing source.
pub struct FrameDecoder {
    state: DecodeState,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        FrameDecoder::new()
    }
}

impl FrameDecoder {
    pub fn new() -> FrameDecoder {
        FrameDecoder {
            state: DecodeState::Idle,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Record a start edge.  The next sample fed in is taken as bit 0.
    pub fn start(&mut self) {
        self.state = DecodeState::Aligning;
    }

    /// Feed one line sample, taken a bit time after the previous one.  A
    /// low line contributes a one bit.
    pub fn sample(&mut self, low: bool) -> Sampled {
        let (bit, accum) = match self.state {
            DecodeState::Idle => return Sampled::More,
            DecodeState::Aligning => (0, 0),
            DecodeState::Sampling { bit, accum } => (bit, accum),
        };
        let accum = if low { accum | (1 << bit) } else { accum };

        if bit + 1 < FRAME_BITS {
            self.state = DecodeState::Sampling {
                bit: bit + 1,
                accum,
            };
            return Sampled::More;
        }

        self.state = DecodeState::Idle;
        if !parity_ok(accum) {
            return Sampled::Reject;
        }
        let data = accum as u8;
        Sampled::Complete(Frame {
            scancode: data & 0x7f,
            release: data & 0x80 != 0,
        })
    }
}

/// Even parity: the ninth bit must equal the popcount of the eight data
/// bits, mod 2.  Any single flipped bit fails this.
fn parity_ok(accum: u16) -> bool {
    let data = accum as u8;
    ((accum >> 8) & 1) == (data.count_ones() & 1) as u16
}

/// Blocking frame reader.  Owns the input pin and a delay source and runs
/// the decoder against real time.
pub struct LineSampler<P, D> {
    pin: P,
    delay: D,
    decoder: FrameDecoder,
}

impl<P, D, E> LineSampler<P, D>
where
    P: InputPin<Error = E>,
    D: DelayUs<u32>,
    E: Debug,
{
    pub fn new(pin: P, delay: D) -> Self {
        LineSampler {
            pin,
            delay,
            decoder: FrameDecoder::new(),
        }
    }

    /// Check the line once; if it has dropped, sample out a whole frame.
    ///
    /// Blocks for the full frame time (about nine bit cells) once a start
    /// edge is seen; nothing else can run on this thread meanwhile, which
    /// is fine since the line is the only input.  Returns `None` when the
    /// line is idle or the frame fails its parity check.
    pub fn poll(&mut self) -> Option<Frame> {
        if self.pin.is_high().unwrap() {
            return None;
        }

        self.decoder.start();
        self.delay.delay_us(ALIGN_US);
        loop {
            match self.decoder.sample(self.pin.is_low().unwrap()) {
                Sampled::More => self.delay.delay_us(SAMPLE_US),
                Sampled::Complete(frame) => return Some(frame),
                Sampled::Reject => {
                    info!("frame dropped: parity mismatch");
                    return None;
                }
            }
        }
    }
}
