//! Play a rainbow on the first attached blink(1).

use std::process;

use blink1::{Error, PatternStep, Rgb};
use tracing_subscriber::EnvFilter;

/// Rainbow pattern, fading to each color over one second.
const RAINBOW: [PatternStep; 9] = [
    PatternStep::new(1., Rgb::new(0xff, 0x00, 0x00)),
    PatternStep::new(1., Rgb::new(0xff, 0xa5, 0x00)),
    PatternStep::new(1., Rgb::new(0xff, 0xff, 0x00)),
    PatternStep::new(1., Rgb::new(0x00, 0x80, 0x00)),
    PatternStep::new(1., Rgb::new(0x00, 0x00, 0xff)),
    PatternStep::new(1., Rgb::new(0x4b, 0x00, 0x82)),
    PatternStep::new(1., Rgb::new(0xee, 0x82, 0xee)),
    PatternStep::new(1., Rgb::new(0x00, 0x00, 0x00)),
    PatternStep::new(1., Rgb::new(0x00, 0x00, 0x00)),
];

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match rainbow() {
        Ok(()) => println!("\x1b[32mRainbow pattern is playing.\x1b[0m"),
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", err);
            process::exit(1);
        },
    }
}

/// Write the rainbow pattern and start playback.
fn rainbow() -> Result<(), Error> {
    let mut blink = blink1::find_first()?;

    blink.set_pattern(&RAINBOW)?;
    blink.play()
}
