//! hidapi backend.
//!
//! The OS HID driver stays bound to the device, reports are written as HID
//! feature reports instead of raw control transfers. Detaching and claiming
//! are not available and always end up ignored.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use tracing::debug;

use crate::device::Blink1;
use crate::error::{Error, TransportError};
use crate::transport::{ControlSetup, Link, Transport};
use crate::{PRODUCT_ID, VENDOR_ID};

/// Locate all blink(1) devices exposed by the HID subsystem.
pub fn find(api: &HidApi) -> Result<Vec<Blink1>, Error> {
    let mut found = Vec::new();

    let infos = api
        .device_list()
        .filter(|info| info.vendor_id() == VENDOR_ID && info.product_id() == PRODUCT_ID);
    for info in infos {
        let path = info.path().to_string_lossy().into_owned();
        let device = info.open_device(api).map_err(|err| Error::Enumeration(err.into()))?;
        debug!("Found blink(1) at {}", path);
        found.push(Blink1::new(HidTransport { device, path }));
    }

    Ok(found)
}

/// blink(1) opened through hidapi.
pub struct HidTransport {
    device: HidDevice,
    path: String,
}

impl Transport for HidTransport {
    fn open(&mut self) -> Result<Box<dyn Link + '_>, TransportError> {
        Ok(Box::new(HidLink(&self.device)))
    }
}

impl Debug for HidTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HidTransport({})", self.path)
    }
}

struct HidLink<'a>(&'a HidDevice);

impl<'a> Link for HidLink<'a> {
    fn detach_kernel_driver(&mut self, _interface: u8) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("detaching the kernel driver"))
    }

    fn claim_interface(&mut self, _interface: u8) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("claiming the interface"))
    }

    fn write_control(
        &mut self,
        _setup: ControlSetup,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<usize, TransportError> {
        // The report ID in the first byte selects the feature report.
        self.0.send_feature_report(data)?;
        Ok(data.len())
    }

    fn release_interface(&mut self, _interface: u8) -> Result<(), TransportError> {
        Ok(())
    }
}
