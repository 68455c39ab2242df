//! Error types.

use thiserror::Error;

/// Failure reported by a transport backend.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[cfg(feature = "hidraw")]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

/// blink(1) errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no blink(1) device attached")]
    DeviceNotFound,

    #[error("pattern length must be between 2 and 12; was {0}")]
    InvalidArgument(usize),

    #[error("control transfer failed: {0}")]
    TransferFailed(#[source] TransportError),

    #[error("unable to enumerate devices: {0}")]
    Enumeration(#[source] TransportError),

    /// Only reported through [`StepOutcome::Ignored`](crate::StepOutcome::Ignored).
    #[error("unable to detach kernel driver: {0}")]
    DriverDetachFailed(#[source] TransportError),

    /// Only reported through [`StepOutcome::Ignored`](crate::StepOutcome::Ignored).
    #[error("unable to claim interface: {0}")]
    InterfaceClaimFailed(#[source] TransportError),
}
