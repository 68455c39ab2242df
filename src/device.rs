//! blink(1) device session.

use std::time::Duration;

use tracing::{debug, trace};

use crate::color::Rgb;
use crate::error::{Error, TransportError};
use crate::pattern::{self, PatternStep};
use crate::report::{Report, REPORT_ID, REPORT_LEN};
use crate::transport::{ClaimReport, ControlSetup, Link, StepOutcome, Transport};

/// Whether a pattern line color still needs gamma correction.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Gamma {
    /// Correct the color before sending it.
    Correct,
    /// Send the color as-is, it is already corrected.
    Raw,
}

/// Session access state.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum SessionState {
    /// No report has been sent yet.
    #[default]
    Unclaimed,
    /// The kernel driver was detached and the interface claimed, as far as the
    /// platform allows it.
    Claimed,
}

/// Session settings.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Options {
    /// HID interface used for all transfers.
    pub interface: u8,
    /// Control transfer timeout, zero waits indefinitely.
    pub timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self { interface: 0, timeout: Duration::ZERO }
    }
}

/// Handle to one blink(1).
///
/// Every command sends its report synchronously and returns once the transfer
/// has completed. The session is not meant to be shared between threads
/// without external locking.
///
/// Note that [`set_color`](Self::set_color) and [`fade_to`](Self::fade_to)
/// gamma correct their color while [`set_raw`](Self::set_raw) and
/// [`fade_raw`](Self::fade_raw) send it unmodified. Mixing both families
/// leads to inconsistent brightness.
#[derive(Debug)]
pub struct Blink1 {
    transport: Box<dyn Transport>,
    options: Options,
    state: SessionState,
    last_claim: Option<ClaimReport>,
}

impl Blink1 {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::with_options(transport, Options::default())
    }

    pub fn with_options<T: Transport + 'static>(transport: T, options: Options) -> Self {
        Self {
            transport: Box::new(transport),
            options,
            state: SessionState::default(),
            last_claim: None,
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Detach and claim outcome of the most recent transmission.
    pub fn last_claim(&self) -> Option<&ClaimReport> {
        self.last_claim.as_ref()
    }

    /// Turn the light off.
    pub fn off(&mut self) -> Result<(), Error> {
        self.set_color(Rgb::BLACK)
    }

    /// Set a gamma corrected color immediately.
    pub fn set_color(&mut self, color: Rgb) -> Result<(), Error> {
        self.send(&Report::set_now(color.degamma()))
    }

    /// Fade to a gamma corrected color over `secs` seconds.
    ///
    /// Durations above 655.35s are reduced to it, durations of zero or less
    /// set the color immediately. This does not wait for the fade to finish.
    pub fn fade_to(&mut self, color: Rgb, secs: f64) -> Result<(), Error> {
        self.send(&Report::fade_to(color.degamma(), secs))
    }

    /// Set a color immediately, without gamma correction.
    pub fn set_raw(&mut self, color: Rgb) -> Result<(), Error> {
        self.send(&Report::set_now(color))
    }

    /// Fade to a color over `secs` seconds, without gamma correction.
    pub fn fade_raw(&mut self, color: Rgb, secs: f64) -> Result<(), Error> {
        self.send(&Report::fade_to(color, secs))
    }

    /// Start playback of the pattern buffer.
    ///
    /// Playback continues until [`stop`](Self::stop) is called.
    pub fn play(&mut self) -> Result<(), Error> {
        self.send(&Report::play(true))
    }

    /// Stop playback of the pattern buffer.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.send(&Report::play(false))
    }

    /// Write one slot of the pattern buffer.
    ///
    /// When playing, the device takes `secs` seconds to fade to `color` at
    /// slot `position`, which must be in `0..12`.
    pub fn write_pattern_line(
        &mut self,
        position: u8,
        color: Rgb,
        secs: f64,
        gamma: Gamma,
    ) -> Result<(), Error> {
        let color = match gamma {
            Gamma::Correct => color.degamma(),
            Gamma::Raw => color,
        };

        self.send(&Report::write_pattern_line(position, color, secs))
    }

    /// Replace the pattern buffer with a repeating pattern of 2 to 12 steps.
    ///
    /// Each step fades to its color over its duration. Shorter patterns are
    /// padded by splitting the last fade into intermediate steps. This only
    /// writes the pattern, call [`play`](Self::play) to start it.
    pub fn set_pattern(&mut self, steps: &[PatternStep]) -> Result<(), Error> {
        for line in pattern::plan(steps)? {
            self.write_pattern_line(line.position, line.color, line.secs, Gamma::Raw)?;
        }

        Ok(())
    }

    /// Send one report to the device.
    fn send(&mut self, report: &Report) -> Result<(), Error> {
        let interface = self.options.interface;
        let timeout = self.options.timeout;

        let link = self.transport.open().map_err(Error::TransferFailed)?;
        let mut scope = TransferScope { link, interface };

        // On Linux the hidraw driver grabs the device on plug in and has to be
        // detached once. Repeated attempts and other platforms fail here.
        let detach = StepOutcome::from_result(
            scope.link.detach_kernel_driver(interface),
            Error::DriverDetachFailed,
        );
        let claim = StepOutcome::from_result(
            scope.link.claim_interface(interface),
            Error::InterfaceClaimFailed,
        );

        if let StepOutcome::Ignored(err) = &detach {
            debug!("Ignoring failed detach: {}", err);
        }
        if let StepOutcome::Ignored(err) = &claim {
            debug!("Ignoring failed claim: {}", err);
        }

        self.state = SessionState::Claimed;
        self.last_claim = Some(ClaimReport { detach, claim });

        trace!("Sending report {:?}", report);

        let setup = ControlSetup::set_report(REPORT_ID);
        let written = scope
            .link
            .write_control(setup, report.as_bytes(), timeout)
            .map_err(Error::TransferFailed)?;

        if written != REPORT_LEN {
            let err = TransportError::ShortWrite { written, expected: REPORT_LEN };
            return Err(Error::TransferFailed(err));
        }

        Ok(())
    }
}

/// Link to the device which releases its interface when dropped.
struct TransferScope<'a> {
    link: Box<dyn Link + 'a>,
    interface: u8,
}

impl<'a> Drop for TransferScope<'a> {
    fn drop(&mut self) {
        if let Err(err) = self.link.release_interface(self.interface) {
            debug!("Unable to release interface {}: {}", self.interface, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::gamma::degamma;

    #[derive(PartialEq, Eq, Debug, Clone)]
    enum Call {
        Open,
        Detach(u8),
        Claim(u8),
        Write(ControlSetup, Vec<u8>, Duration),
        Release(u8),
    }

    /// In-memory transport recording every call.
    #[derive(Default, Debug, Clone)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_open: bool,
        fail_detach: bool,
        fail_claim: bool,
        fail_release: bool,
        /// Number of successful writes before every following write fails.
        writes_before_failure: Option<usize>,
        short_write: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn writes(&self) -> Vec<Vec<u8>> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Write(_, data, _) => Some(data),
                    _ => None,
                })
                .collect()
        }

        fn session(&self) -> Blink1 {
            Blink1::new(self.clone())
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Transport for Recorder {
        fn open(&mut self) -> Result<Box<dyn Link + '_>, TransportError> {
            self.record(Call::Open);
            if self.fail_open {
                return Err(TransportError::Usb(rusb::Error::NoDevice));
            }
            Ok(Box::new(self.clone()))
        }
    }

    impl Link for Recorder {
        fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), TransportError> {
            self.record(Call::Detach(interface));
            if self.fail_detach {
                return Err(TransportError::Usb(rusb::Error::NotFound));
            }
            Ok(())
        }

        fn claim_interface(&mut self, interface: u8) -> Result<(), TransportError> {
            self.record(Call::Claim(interface));
            if self.fail_claim {
                return Err(TransportError::Usb(rusb::Error::Busy));
            }
            Ok(())
        }

        fn write_control(
            &mut self,
            setup: ControlSetup,
            data: &[u8],
            timeout: Duration,
        ) -> Result<usize, TransportError> {
            let written = self.writes().len();
            self.record(Call::Write(setup, data.to_vec(), timeout));

            if self.writes_before_failure.map_or(false, |limit| written >= limit) {
                return Err(TransportError::Usb(rusb::Error::NoDevice));
            }

            if self.short_write {
                return Ok(data.len() - 1);
            }

            Ok(data.len())
        }

        fn release_interface(&mut self, interface: u8) -> Result<(), TransportError> {
            self.record(Call::Release(interface));
            if self.fail_release {
                return Err(TransportError::Usb(rusb::Error::NotFound));
            }
            Ok(())
        }
    }

    #[test]
    fn transmission_sequence() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();
        assert_eq!(blink.state(), SessionState::Unclaimed);

        blink.play().unwrap();

        let setup = ControlSetup::set_report(REPORT_ID);
        assert_eq!(recorder.calls(), vec![
            Call::Open,
            Call::Detach(0),
            Call::Claim(0),
            Call::Write(setup, vec![1, b'p', 1, 0, 0, 0, 0, 0, 0], Duration::ZERO),
            Call::Release(0),
        ]);

        assert_eq!(blink.state(), SessionState::Claimed);
        let claim = blink.last_claim().unwrap();
        assert!(claim.detach.is_done());
        assert!(claim.claim.is_done());
    }

    #[test]
    fn detach_and_claim_failures_are_ignored() {
        let recorder = Recorder { fail_detach: true, fail_claim: true, ..Default::default() };
        let mut blink = recorder.session();

        blink.stop().unwrap();

        assert_eq!(recorder.writes(), vec![vec![1, b'p', 0, 0, 0, 0, 0, 0, 0]]);
        assert_eq!(blink.state(), SessionState::Claimed);

        let claim = blink.last_claim().unwrap();
        assert!(matches!(claim.detach, StepOutcome::Ignored(Error::DriverDetachFailed(_))));
        assert!(matches!(claim.claim, StepOutcome::Ignored(Error::InterfaceClaimFailed(_))));
    }

    #[test]
    fn transfer_failure_propagates_and_releases() {
        let recorder = Recorder { writes_before_failure: Some(0), ..Default::default() };
        let mut blink = recorder.session();

        let result = blink.off();
        assert!(matches!(
            result,
            Err(Error::TransferFailed(TransportError::Usb(rusb::Error::NoDevice)))
        ));
        assert_eq!(recorder.calls().last(), Some(&Call::Release(0)));
    }

    #[test]
    fn open_failure_is_transfer_failure() {
        let recorder = Recorder { fail_open: true, ..Default::default() };
        let mut blink = recorder.session();

        assert!(matches!(blink.play(), Err(Error::TransferFailed(_))));
        assert_eq!(recorder.calls(), vec![Call::Open]);
        assert_eq!(blink.state(), SessionState::Unclaimed);
    }

    #[test]
    fn short_write_fails() {
        let recorder = Recorder { short_write: true, ..Default::default() };
        let mut blink = recorder.session();

        match blink.play() {
            Err(Error::TransferFailed(TransportError::ShortWrite { written, expected })) => {
                assert_eq!((written, expected), (8, 9));
            },
            other => panic!("expected short write, got {:?}", other),
        }
    }

    #[test]
    fn release_failure_is_ignored() {
        let recorder = Recorder { fail_release: true, ..Default::default() };
        let mut blink = recorder.session();

        blink.play().unwrap();
        assert_eq!(recorder.calls().last(), Some(&Call::Release(0)));
    }

    #[test]
    fn options_are_applied() {
        let recorder = Recorder::default();
        let options = Options { interface: 2, timeout: Duration::from_millis(500) };
        let mut blink = Blink1::with_options(recorder.clone(), options);
        assert_eq!(blink.options(), options);

        blink.play().unwrap();

        let calls = recorder.calls();
        assert_eq!(calls[1], Call::Detach(2));
        assert_eq!(calls[2], Call::Claim(2));
        assert!(matches!(calls[3], Call::Write(_, _, timeout) if timeout == options.timeout));
        assert_eq!(calls[4], Call::Release(2));
    }

    #[test]
    fn set_then_fade() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();

        blink.set_color(Rgb::new(200, 0, 0)).unwrap();
        blink.fade_to(Rgb::new(0, 200, 0), 2.).unwrap();

        assert_eq!(recorder.writes(), vec![
            vec![1, b'n', degamma(200), 0, 0, 0, 0, 0, 0],
            vec![1, b'c', 0, degamma(200), 0, 0, 200, 0, 0],
        ]);
    }

    #[test]
    fn raw_commands_skip_gamma() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();

        blink.set_raw(Rgb::new(200, 100, 50)).unwrap();
        blink.fade_raw(Rgb::new(200, 100, 50), 0.).unwrap();
        blink.fade_raw(Rgb::new(200, 100, 50), 1.).unwrap();

        let writes = recorder.writes();
        assert_eq!(writes[0], vec![1, b'n', 200, 100, 50, 0, 0, 0, 0]);
        assert_eq!(writes[1], writes[0]);
        assert_eq!(writes[2], vec![1, b'c', 200, 100, 50, 0, 100, 0, 0]);
    }

    #[test]
    fn off_sends_black() {
        let recorder = Recorder::default();
        recorder.session().off().unwrap();
        assert_eq!(recorder.writes(), vec![vec![1, b'n', 0, 0, 0, 0, 0, 0, 0]]);
    }

    #[test]
    fn pattern_line_gamma_selection() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();

        blink.write_pattern_line(4, Rgb::new(200, 0, 0), 1., Gamma::Correct).unwrap();
        blink.write_pattern_line(5, Rgb::new(200, 0, 0), 1., Gamma::Raw).unwrap();

        let writes = recorder.writes();
        assert_eq!(writes[0], vec![1, b'P', degamma(200), 0, 0, 0, 100, 4, 0]);
        assert_eq!(writes[1], vec![1, b'P', 200, 0, 0, 0, 100, 5, 0]);
    }

    #[test]
    fn full_pattern_is_written_verbatim() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();

        let steps: Vec<_> =
            (0..12u8).map(|i| PatternStep::new(0.5, Rgb::new(i * 20, 255 - i, 7))).collect();
        blink.set_pattern(&steps).unwrap();

        let writes = recorder.writes();
        assert_eq!(writes.len(), 12);
        for (i, (write, step)) in writes.iter().zip(&steps).enumerate() {
            let color = step.color.degamma();
            assert_eq!(write, &vec![1, b'P', color.r, color.g, color.b, 0, 50, i as u8, 0]);
        }
    }

    #[test]
    fn short_pattern_fills_all_slots() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();

        let mut steps: Vec<_> =
            (0..8u8).map(|i| PatternStep::new(1., Rgb::new(i * 30, 0, 0))).collect();
        steps.push(PatternStep::new(2.5, Rgb::new(255, 255, 255)));
        blink.set_pattern(&steps).unwrap();

        let writes = recorder.writes();
        assert_eq!(writes.len(), 12);
        for (i, write) in writes.iter().enumerate() {
            assert_eq!(write[7], i as u8);
        }
        for (write, step) in writes.iter().zip(&steps[..8]) {
            let color = step.color.degamma();
            assert_eq!(&write[2..5], &color.channels());
            assert_eq!(&write[5..7], &[0, 100]);
        }

        // Last four slots lie between the last two corrected colors.
        let left = steps[7].color.degamma();
        let mut previous = left.g;
        for write in &writes[8..] {
            assert!(write[2] >= left.r);
            assert!(write[3] > previous);
            assert_eq!(&write[5..7], &[0, 50]);
            previous = write[3];
        }
    }

    #[test]
    fn invalid_pattern_sends_nothing() {
        let recorder = Recorder::default();
        let mut blink = recorder.session();

        let one = [PatternStep::new(1., Rgb::BLACK)];
        assert!(matches!(blink.set_pattern(&one), Err(Error::InvalidArgument(1))));

        let thirteen = vec![PatternStep::new(1., Rgb::BLACK); 13];
        assert!(matches!(blink.set_pattern(&thirteen), Err(Error::InvalidArgument(13))));

        assert!(recorder.calls().is_empty());
        assert_eq!(blink.state(), SessionState::Unclaimed);
    }

    #[test]
    fn pattern_stops_at_first_failure() {
        let recorder = Recorder { writes_before_failure: Some(3), ..Default::default() };
        let mut blink = recorder.session();

        let steps = vec![PatternStep::new(1., Rgb::new(10, 20, 30)); 12];
        assert!(matches!(blink.set_pattern(&steps), Err(Error::TransferFailed(_))));

        assert_eq!(recorder.writes().len(), 4);
    }
}
