//! libusb backend.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use rusb::{Device, DeviceHandle, GlobalContext};
use tracing::debug;

use crate::device::Blink1;
use crate::error::{Error, TransportError};
use crate::transport::{ControlSetup, Link, Transport};
use crate::{PRODUCT_ID, VENDOR_ID};

/// Locate all attached blink(1) devices.
///
/// Devices are returned in the order libusb lists them.
pub fn find() -> Result<Vec<Blink1>, Error> {
    let devices = rusb::devices().map_err(|err| Error::Enumeration(err.into()))?;

    let mut found = Vec::new();
    for device in devices.iter() {
        let descriptor = match device.device_descriptor() {
            Ok(descriptor) => descriptor,
            Err(err) => {
                debug!("Skipping unreadable device {:?}: {}", device, err);
                continue;
            },
        };

        if descriptor.vendor_id() == VENDOR_ID && descriptor.product_id() == PRODUCT_ID {
            let transport = UsbTransport::new(device);
            debug!("Found blink(1) {}", transport);
            found.push(Blink1::new(transport));
        }
    }

    Ok(found)
}

/// Locate the first attached blink(1) device.
pub fn find_first() -> Result<Blink1, Error> {
    find()?.into_iter().next().ok_or(Error::DeviceNotFound)
}

/// blink(1) on the libusb bus.
pub struct UsbTransport {
    device: Device<GlobalContext>,
}

impl UsbTransport {
    pub fn new(device: Device<GlobalContext>) -> Self {
        Self { device }
    }
}

impl Transport for UsbTransport {
    fn open(&mut self) -> Result<Box<dyn Link + '_>, TransportError> {
        Ok(Box::new(UsbLink(self.device.open()?)))
    }
}

impl Debug for UsbTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UsbTransport({})", self)
    }
}

impl fmt::Display for UsbTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "bus {:03} device {:03}", self.device.bus_number(), self.device.address())
    }
}

/// Open libusb handle, closed when dropped.
struct UsbLink(DeviceHandle<GlobalContext>);

impl Link for UsbLink {
    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError> {
        Ok(self.0.detach_kernel_driver(interface)?)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), TransportError> {
        Ok(self.0.claim_interface(interface)?)
    }

    fn write_control(
        &mut self,
        setup: ControlSetup,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        // libusb only carries the low byte of the request word in bRequest.
        let request = setup.request as u8;

        Ok(self.0.write_control(setup.request_type, request, setup.value, setup.index, data, timeout)?)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), TransportError> {
        Ok(self.0.release_interface(interface)?)
    }
}
