// Usb HID management.

use arraydeque::ArrayDeque;
use defmt::{info, warn};
use frunk::{HCons, HNil};
use pcjr_keyboard::Report;
use usb_device::class_prelude::{UsbBus, UsbBusAllocator, UsbClass};
use usb_device::prelude::{UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid};
use usbd_human_interface_device::device::keyboard::{NKROBootKeyboard, NKROBootKeyboardConfig};
use usbd_human_interface_device::device::DeviceClass;
use usbd_human_interface_device::usb_class::{UsbHidClass, UsbHidClassBuilder};
use usbd_human_interface_device::UsbHidError;

// Type of the device list, which is internal to usbd_human_interface_device.
type InterfaceList<'a, Bus> = HCons<NKROBootKeyboard<'a, Bus>, HNil>;

pub struct UsbHandler<'a, Bus: UsbBus> {
    dev: UsbDevice<'a, Bus>,
    hid: UsbHidClass<'a, Bus, InterfaceList<'a, Bus>>,
    state: Option<UsbDeviceState>,
    pending: ArrayDeque<Report, 16>,
    caps_lock: bool,
}

impl<'a, Bus: UsbBus> UsbHandler<'a, Bus> {
    pub fn new(usb_bus: &'a UsbBusAllocator<Bus>) -> Self {
        let keyboard = UsbHidClassBuilder::new()
            .add_device(NKROBootKeyboardConfig::default())
            .build(usb_bus);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x1209, 0x0003))
            .manufacturer("pcjr-bridge")
            .product("PCjr keyboard bridge")
            .serial_number("development")
            .device_class(0)
            .max_power(500)
            .build();
        UsbHandler {
            hid: keyboard,
            dev: usb_dev,
            state: None,
            pending: ArrayDeque::new(),
            caps_lock: false,
        }
    }

    /// True once the host has configured us and reports can go out.
    pub fn ready(&self) -> bool {
        self.state == Some(UsbDeviceState::Configured)
    }

    /// Caps lock bit from the most recent host LED report.
    pub fn caps_lock(&self) -> bool {
        self.caps_lock
    }

    /// Queue a report to ship to the host.  Fire and forget: if the queue
    /// is full, log a message, but discard.
    pub fn enqueue_report(&mut self, report: Report) {
        if self.pending.push_back(report).is_err() {
            info!("Report queue full.");
        }
    }

    /// Perform a 1khz tick operation.
    pub fn tick(&mut self) {
        match self.hid.device().tick() {
            Ok(()) => (),
            Err(_) => info!("tick error"),
        }

        // If we have a report to send, try to do that here.
        if let Some(report) = self.pending.front() {
            match self.hid.device().write_report(report.iter().cloned()) {
                Ok(()) => {
                    // Successfully queued, so remove.
                    let _ = self.pending.pop_front();
                }
                Err(UsbHidError::WouldBlock) => (),
                Err(UsbHidError::Duplicate) => {
                    // Same keys as last time; nothing new to say.
                    let _ = self.pending.pop_front();
                }
                Err(UsbHidError::UsbError(_)) => warn!("USB error"),
                Err(UsbHidError::SerializationError) => warn!("SerializationError"),
            }
        }
    }

    /// Perform a periodic poll.  Ideally, this would be interrupt driven,
    /// but calling sufficiently fast should also work.
    pub fn poll(&mut self) {
        if self.dev.poll(&mut [&mut self.hid]) {
            self.hid.poll();
            if let Ok(leds) = self.hid.device().read_report() {
                self.caps_lock = leds.caps_lock;
            }
        }

        // Check for state changes.
        let new_state = self.dev.state();
        let update = match self.state {
            None => true,
            Some(s) if s == new_state => false,
            _ => true,
        };
        if update {
            match new_state {
                UsbDeviceState::Addressed => info!("State: Addressed"),
                UsbDeviceState::Configured => info!("State: Configured"),
                UsbDeviceState::Default => info!("State: Default"),
                UsbDeviceState::Suspend => info!("State: Suspend"),
            }
            self.state = Some(new_state);
        }
    }
}
