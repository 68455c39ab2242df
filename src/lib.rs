//! blink(1) USB notification light driver.
//!
//! Devices are located with [`find`], which hands out one [`Blink1`] session
//! per attached light. Every command is encoded as a 9-byte HID report and
//! written with a blocking control transfer.
//!
//! ```no_run
//! use blink1::{PatternStep, Rgb};
//!
//! let mut blink = blink1::find_first()?;
//! blink.fade_to(Rgb::new(0xff, 0x80, 0x00), blink1::DEFAULT_FADE_SECS)?;
//!
//! blink.set_pattern(&[
//!     PatternStep::new(1., Rgb::new(0xff, 0, 0)),
//!     PatternStep::new(1., Rgb::new(0, 0, 0xff)),
//! ])?;
//! blink.play()?;
//! # Ok::<(), blink1::Error>(())
//! ```

mod color;
mod device;
mod error;
mod gamma;
#[cfg(feature = "hidraw")]
pub mod hidraw;
mod pattern;
mod report;
mod transport;
mod usb;

pub use crate::color::{ParseRgbError, Rgb};
pub use crate::device::{Blink1, Gamma, Options, SessionState};
pub use crate::error::{Error, TransportError};
pub use crate::gamma::degamma;
pub use crate::pattern::{plan, PatternLine, PatternStep, MIN_PATTERN_STEPS};
pub use crate::report::{
    Centiseconds, Opcode, Report, DEFAULT_FADE_SECS, MAX_DURATION_SECS, PATTERN_SLOTS, REPORT_ID,
    REPORT_LEN,
};
pub use crate::transport::{ClaimReport, ControlSetup, Link, StepOutcome, Transport, HID_SET_REPORT};
pub use crate::usb::{find, find_first, UsbTransport};

/// blink(1) USB vendor ID.
pub const VENDOR_ID: u16 = 0x27b8;

/// blink(1) USB product ID.
pub const PRODUCT_ID: u16 = 0x01ed;
