//! Pattern buffer planning.
//!
//! The device plays back a fixed ring of [`PATTERN_SLOTS`] slots, each fading
//! to its color over its duration. Patterns with fewer steps are padded by
//! splitting the final fade into evenly spaced intermediate colors, so the
//! ring still ends with a smooth transition into the repeat point.

use crate::color::Rgb;
use crate::error::Error;
use crate::report::PATTERN_SLOTS;

/// Shortest pattern accepted by [`plan`].
pub const MIN_PATTERN_STEPS: usize = 2;

/// One user supplied pattern step.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct PatternStep {
    /// Time to fade to `color`, in seconds.
    pub secs: f64,
    pub color: Rgb,
}

impl PatternStep {
    pub const fn new(secs: f64, color: Rgb) -> Self {
        Self { secs, color }
    }
}

impl<C: Into<Rgb>> From<(f64, C)> for PatternStep {
    fn from((secs, color): (f64, C)) -> Self {
        Self { secs, color: color.into() }
    }
}

/// Content of one pattern buffer slot.
///
/// The color is already gamma corrected.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct PatternLine {
    pub position: u8,
    pub color: Rgb,
    pub secs: f64,
}

/// Expand pattern steps into exactly [`PATTERN_SLOTS`] gamma corrected lines.
///
/// Fails with [`Error::InvalidArgument`] unless `2 <= steps.len() <= 12`.
pub fn plan(steps: &[PatternStep]) -> Result<Vec<PatternLine>, Error> {
    let len = steps.len();
    if len < MIN_PATTERN_STEPS || len > PATTERN_SLOTS {
        return Err(Error::InvalidArgument(len));
    }

    let mut slots: Vec<(f64, Rgb)> =
        steps.iter().map(|step| (step.secs, step.color.degamma())).collect();

    if len < PATTERN_SLOTS {
        let npoints = PATTERN_SLOTS - len + 2;

        let (right_secs, right) = slots[len - 1];
        let left = slots[len - 2].1;
        let secs = right_secs / npoints as f64;

        // The final step is replaced by the interpolated fade towards it.
        slots.truncate(len - 1);
        slots.extend((1..npoints).map(|i| (secs, interpolate(left, right, i, npoints))));
    }

    let lines = slots
        .into_iter()
        .enumerate()
        .map(|(position, (secs, color))| PatternLine { position: position as u8, color, secs })
        .collect();

    Ok(lines)
}

/// Color `step / steps` of the way from `left` to `right`, truncated.
fn interpolate(left: Rgb, right: Rgb, step: usize, steps: usize) -> Rgb {
    let channel = |left: u8, right: u8| {
        let (left, right) = (left as usize, right as usize);
        ((left * (steps - step) + right * step) / steps) as u8
    };

    Rgb::new(channel(left.r, right.r), channel(left.g, right.g), channel(left.b, right.b))
}
