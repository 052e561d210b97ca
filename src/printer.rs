use tracing::{debug, instrument};

use crate::firmware::{Clock, FirmwareConfig, SystemClock, VirtualFirmware};
use crate::transport::{LoopbackLink, NoisyChannel, SerialPort};

/// Client-facing serial port backed by a [`VirtualFirmware`].
///
/// Every observation (`bytes_available`, `read`, `read_line`) first runs one
/// firmware poll, so the device appears to answer as soon as output is
/// requested. Writes alone never run the firmware.
#[derive(Debug)]
pub struct MockPrinter {
    port: NoisyChannel,
    firmware: VirtualFirmware,
    dtr: bool,
}

impl MockPrinter {
    /// Creates a printer on a noise-free link with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_link(LoopbackLink::new(), FirmwareConfig::default())
    }

    /// Creates a printer on an explicit link, driven by the wall clock.
    #[must_use]
    pub fn from_link(link: LoopbackLink, config: FirmwareConfig) -> Self {
        Self::from_link_with_clock(link, config, SystemClock)
    }

    /// Creates a printer on an explicit link and clock.
    #[must_use]
    pub fn from_link_with_clock(
        link: LoopbackLink,
        config: FirmwareConfig,
        clock: impl Clock + 'static,
    ) -> Self {
        let (port, device) = link.into_endpoints();
        Self {
            port,
            firmware: VirtualFirmware::with_clock(device, config, clock),
            dtr: false,
        }
    }

    /// Read access to the emulated device.
    #[must_use]
    pub fn firmware(&self) -> &VirtualFirmware {
        &self.firmware
    }

    #[must_use]
    pub fn dtr(&self) -> bool {
        self.dtr
    }

    /// Drives the DTR line. A falling edge resets the device.
    pub fn set_dtr(&mut self, state: bool) {
        if self.dtr && !state {
            debug!("dtr dropped");
            SerialPort::reset(self);
        }
        self.dtr = state;
    }
}

impl Default for MockPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort for MockPrinter {
    fn write(&mut self, data: &[u8]) {
        self.port.write(data);
    }

    fn read(&mut self, num_bytes: usize) -> Vec<u8> {
        self.firmware.poll();
        self.port.read(num_bytes)
    }

    fn read_line(&mut self) -> Vec<u8> {
        self.firmware.poll();
        self.port.read_line()
    }

    fn bytes_available(&mut self) -> usize {
        self.firmware.poll();
        self.port.bytes_available()
    }

    /// Clears both link directions and the device session, keeping stored
    /// files.
    #[instrument(skip(self), level = "debug")]
    fn reset(&mut self) {
        self.port.reset();
        self.firmware.reset();
    }
}
