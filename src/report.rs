//! blink(1) HID report encoding.
//!
//! Every command is a fixed 9-byte feature report:
//!
//! | Offset | Meaning                                              |
//! |--------|------------------------------------------------------|
//! | 0      | Report ID, always [`REPORT_ID`]                      |
//! | 1      | Command opcode                                       |
//! | 2..=4  | R, G, B                                              |
//! | 5..=7  | duration high/low byte and padding, or the play flag |
//! | 8      | pattern position, or padding                         |
//!
//! None of the builders apply gamma correction, callers pass the channel
//! values that should end up on the wire.

use std::fmt::{self, Debug, Formatter};

use bytes::BufMut;

use crate::color::Rgb;

/// HID report ID used by every command.
pub const REPORT_ID: u8 = 1;

/// Size of every report in bytes.
pub const REPORT_LEN: usize = 9;

/// Number of slots in the device's pattern buffer.
pub const PATTERN_SLOTS: usize = 12;

/// Longest duration the device can represent, in seconds.
pub const MAX_DURATION_SECS: f64 = 655.35;

/// Default fade duration in seconds.
pub const DEFAULT_FADE_SECS: f64 = 2.0;

/// Command opcode stored in the second report byte.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Opcode {
    SetNow,
    Fade,
    Play,
    WritePatternLine,
}

impl Opcode {
    pub const fn byte(self) -> u8 {
        match self {
            Self::SetNow => b'n',
            Self::Fade => b'c',
            Self::Play => b'p',
            Self::WritePatternLine => b'P',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'n' => Some(Self::SetNow),
            b'c' => Some(Self::Fade),
            b'p' => Some(Self::Play),
            b'P' => Some(Self::WritePatternLine),
            _ => None,
        }
    }
}

/// Duration in the device's native unit of 1/100 s.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub struct Centiseconds(pub u16);

impl Centiseconds {
    pub const MAX: Centiseconds = Centiseconds(u16::MAX);

    /// Convert seconds to centiseconds.
    ///
    /// Durations above [`MAX_DURATION_SECS`] are reduced to it, negative or
    /// NaN durations become zero. Fractions of a centisecond are truncated.
    pub fn from_secs(secs: f64) -> Self {
        let secs = if secs > MAX_DURATION_SECS { MAX_DURATION_SECS } else { secs };

        // Float to int casts saturate, which also maps NaN to zero.
        Self((secs * 100.) as u16)
    }

    pub fn as_secs(self) -> f64 {
        f64::from(self.0) / 100.
    }
}

/// Encoded 9-byte command.
#[derive(PartialEq, Eq, Copy, Clone)]
pub struct Report([u8; REPORT_LEN]);

impl Report {
    /// Set the LEDs to a color immediately.
    pub fn set_now(color: Rgb) -> Self {
        Self::build(Opcode::SetNow, |buf| {
            buf.put_slice(&color.channels());
        })
    }

    /// Fade to a color over `secs` seconds.
    ///
    /// A duration of zero or less is sent as [`Report::set_now`].
    pub fn fade_to(color: Rgb, secs: f64) -> Self {
        if secs <= 0. {
            return Self::set_now(color);
        }

        Self::build(Opcode::Fade, |buf| {
            buf.put_slice(&color.channels());
            buf.put_u16(Centiseconds::from_secs(secs).0);
        })
    }

    /// Start or stop playback of the pattern buffer.
    pub fn play(start: bool) -> Self {
        Self::build(Opcode::Play, |buf| {
            buf.put_u8(start as u8);
        })
    }

    /// Store a color and fade duration in one pattern buffer slot.
    ///
    /// Positions outside of `0..12` are sent as-is and ignored by the device.
    pub fn write_pattern_line(position: u8, color: Rgb, secs: f64) -> Self {
        Self::build(Opcode::WritePatternLine, |buf| {
            buf.put_slice(&color.channels());
            buf.put_u16(Centiseconds::from_secs(secs).0);
            buf.put_u8(position);
        })
    }

    /// Write the report header and let `body` fill the payload.
    ///
    /// Unwritten payload bytes stay zero.
    fn build<F>(opcode: Opcode, body: F) -> Self
    where
        F: FnOnce(&mut &mut [u8]),
    {
        let mut bytes = [0; REPORT_LEN];

        let mut buf = &mut bytes[..];
        buf.put_u8(REPORT_ID);
        buf.put_u8(opcode.byte());
        body(&mut buf);

        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.0[1])
    }

    /// Color of set, fade and pattern commands.
    pub fn color(&self) -> Rgb {
        Rgb::new(self.0[2], self.0[3], self.0[4])
    }

    /// Duration of fade and pattern commands.
    pub fn duration(&self) -> Centiseconds {
        Centiseconds(u16::from_be_bytes([self.0[5], self.0[6]]))
    }

    /// Slot of a pattern command.
    pub fn position(&self) -> u8 {
        self.0[7]
    }

    /// Playback flag of a play command.
    pub fn play_flag(&self) -> bool {
        self.0[2] != 0
    }
}

impl Debug for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", self.0)
    }
}
