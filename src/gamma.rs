//! Perceptual brightness correction.
//!
//! The blink(1) LEDs are driven linearly, so evenly spaced input values look
//! bunched up at the bright end. This maps a logical 0..=255 brightness onto
//! a piecewise-linear approximation of an exponential curve.

/// Precomputed correction curve for every 8-bit input.
const DEGAMMA: [u8; 256] = build_table();

/// Map a logical brightness onto the physical LED brightness.
#[inline]
pub fn degamma(n: u8) -> u8 {
    DEGAMMA[n as usize]
}

/// Evaluate the correction curve directly.
///
/// The input is split into a 3-bit exponent and a 5-bit mantissa
/// (`n = 32 * exp + mant`), the output is
/// `(2^exp - 1) + (2^exp * (mant + 1) + 15) / 32` using integer division.
const fn curve(n: u8) -> u8 {
    let exp = (n / 32) as u32;
    let mant = (n % 32) as u32;
    let scale = 1u32 << exp;

    ((scale - 1) + (scale * (mant + 1) + 15) / 32) as u8
}

const fn build_table() -> [u8; 256] {
    let mut table = [0; 256];

    let mut i = 0;
    while i < 256 {
        table[i] = curve(i as u8);
        i += 1;
    }

    table
}
