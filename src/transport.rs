//! Transport abstraction.
//!
//! A [`Transport`] identifies one physical device. Every outgoing report opens
//! a short-lived [`Link`] to it, which is released again once the report has
//! been written.

use std::fmt::Debug;
use std::time::Duration;

use rusb::{Direction, Recipient, RequestType};

use crate::error::{Error, TransportError};

/// HID class request type for sending a report to the device.
pub const HID_SET_REPORT: u8 = 3;

/// Setup stage of a control transfer.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct ControlSetup {
    pub request_type: u8,
    pub request: u16,
    pub value: u16,
    pub index: u16,
}

impl ControlSetup {
    /// Class specific, interface directed, host-to-device report write.
    pub fn set_report(report_id: u8) -> Self {
        Self {
            request_type: rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface),
            request: (u16::from(HID_SET_REPORT) << 8) | u16::from(report_id),
            value: 0,
            index: 0,
        }
    }
}

/// Physical device reachable through some USB stack.
pub trait Transport: Debug + Send {
    /// Open a handle for the duration of one report.
    fn open(&mut self) -> Result<Box<dyn Link + '_>, TransportError>;
}

/// Open handle to a device.
pub trait Link {
    /// Detach the OS driver bound to `interface`.
    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError>;

    /// Claim `interface` for exclusive use.
    fn claim_interface(&mut self, interface: u8) -> Result<(), TransportError>;

    /// Write `data` with a control transfer, returning the number of bytes sent.
    ///
    /// A zero `timeout` waits indefinitely.
    fn write_control(
        &mut self,
        setup: ControlSetup,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, TransportError>;

    /// Give up a claimed `interface`.
    fn release_interface(&mut self, interface: u8) -> Result<(), TransportError>;
}

/// Result of a platform specific step whose failure is not fatal.
#[derive(Debug)]
pub enum StepOutcome {
    Done,
    Ignored(Error),
}

impl StepOutcome {
    pub(crate) fn from_result<F>(result: Result<(), TransportError>, reason: F) -> Self
    where
        F: FnOnce(TransportError) -> Error,
    {
        match result {
            Ok(()) => Self::Done,
            Err(err) => Self::Ignored(reason(err)),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Outcome of the detach and claim steps preceding a transfer.
#[derive(Debug)]
pub struct ClaimReport {
    pub detach: StepOutcome,
    pub claim: StepOutcome,
}
