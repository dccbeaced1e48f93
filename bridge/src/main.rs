//! PCjr keyboard to USB bridge firmware.
//!
//! Watches the keyboard's serial line, decodes key events with the core
//! crate, and ships HID reports to the host.  The status LED blinks while
//! waiting for USB and then tracks the host's caps lock state.

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::sync::atomic::{AtomicU16, Ordering};

use cortex_m::interrupt::Mutex;
use defmt::info;
use defmt_rtt as _;
use fugit::MicrosDurationU32;
use panic_probe as _;

use pcjr_keyboard::{KeyboardState, LineSampler};

// Provide an alias for our BSP so we can switch targets quickly.
use sparkfun_pro_micro_rp2040 as bsp;

use bsp::entry;
use bsp::hal;
use bsp::hal::{
    clocks::{init_clocks_and_plls, Clock},
    pac,
    pac::interrupt,
    pio::PIOExt,
    sio::Sio,
    timer::{Alarm, Alarm0},
    watchdog::Watchdog,
    Timer,
};
use bsp::XOSC_CRYSTAL_FREQ;

use usb_device::class_prelude::UsbBusAllocator;
use ws2812_pio::Ws2812Direct;

mod leds;
mod usb;

/// Idle counter tick, about 61 Hz.
const IDLE_TICK: MicrosDurationU32 = MicrosDurationU32::micros(16_384);

/// Idle tick count.  Reserved for an inactivity timeout that was never
/// wired up; today it just wraps.
static IDLE_COUNT: AtomicU16 = AtomicU16::new(0);

/// The alarm driving the idle counter, shared with its interrupt.
static IDLE_ALARM: Mutex<RefCell<Option<Alarm0>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let core = pac::CorePeripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    info!("Program start");
    // External high-speed crystal on the pico board is 12Mhz
    let clocks = init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let delay = cortex_m::delay::Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());

    let pins = bsp::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // The 61 Hz idle counter.
    let mut alarm = timer.alarm_0().unwrap();
    let _ = alarm.schedule(IDLE_TICK);
    alarm.enable_interrupt();
    cortex_m::interrupt::free(|cs| {
        IDLE_ALARM.borrow(cs).replace(Some(alarm));
    });
    unsafe {
        pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_0);
    }

    let (mut pio, sm0, _, _, _) = pac.PIO0.split(&mut pac.RESETS);
    let ws = Ws2812Direct::new(
        pins.led.into_function(),
        &mut pio,
        sm0,
        clocks.peripheral_clock.freq(),
    );
    let mut led_manager = leds::LedManager::new(ws);

    let usb_bus = UsbBusAllocator::new(hal::usb::UsbBus::new(
        pac.USBCTRL_REGS,
        pac.USBCTRL_DPRAM,
        clocks.usb_clock,
        true,
        &mut pac.RESETS,
    ));
    let mut usb_handler = usb::UsbHandler::new(&usb_bus);

    // The keyboard's data line, idle high.
    let jr_line = pins.gpio2.into_pull_up_input();
    let mut sampler = LineSampler::new(jr_line, delay);
    let mut state = KeyboardState::new();

    // TODO: Use the fugit values, and actual intervals.
    let mut next_1ms = timer.get_counter().ticks() + 1_000;
    let mut next_10us = timer.get_counter().ticks() + 10;
    let mut ready_at: Option<u64> = None;
    loop {
        let now = timer.get_counter().ticks();

        // Rapid poll first.
        if now > next_10us {
            usb_handler.poll();
            next_10us = now + 10;
        }

        // Slow poll next.
        if now > next_1ms {
            usb_handler.tick();
            led_manager.tick(usb_handler.ready(), usb_handler.caps_lock());
            next_1ms = now + 1_000;
        }

        // Nothing goes out until the host has configured us.  If we're
        // powered without a host attached, this waits forever.
        if !usb_handler.ready() {
            ready_at = None;
            continue;
        }
        let settled = match ready_at {
            None => {
                ready_at = Some(now);
                false
            }
            // Give the host's OS a second to load drivers and actually be
            // ready for input.
            Some(t) => now >= t + 1_000_000,
        };
        if !settled {
            continue;
        }

        // Sampling a frame blocks for the whole frame, about 4ms.  Key
        // events are the only input, so there is nothing to miss.
        if let Some(frame) = sampler.poll() {
            state.handle_frame(frame);
            usb_handler.enqueue_report(state.report());
        }
    }
}

// This interrupt runs approx 61 times per second, keeping the idle
// counter going.  Nothing consumes the counter yet.
#[interrupt]
fn TIMER_IRQ_0() {
    cortex_m::interrupt::free(|cs| {
        let mut alarm = IDLE_ALARM.borrow(cs).borrow_mut();
        if let Some(alarm) = alarm.as_mut() {
            alarm.clear_interrupt();
            let _ = alarm.schedule(IDLE_TICK);
        }
    });

    let count = IDLE_COUNT.load(Ordering::Relaxed) + 1;
    IDLE_COUNT.store(if count > 61 { 0 } else { count }, Ordering::Relaxed);
}
