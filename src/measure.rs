//! Timed measurement loop
//!
//! One trial: wait out the jittered delay, assert the output, spin until the
//! backend sees the assertion, record the elapsed time, then deassert and wait
//! for the backend to follow so the next trial starts from a known state. Only
//! the rising edge is timed.

use crate::config::RunConfig;
use crate::delay::{self, DelayError};
use crate::detect::Detector;
use crate::gpio::OutputSignal;
use log::{debug, info};
use std::thread;
use std::time::{Duration, Instant};

/// Loop progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Hardware not claimed yet
    Idle,
    Initialized,
    Running(usize),
    Done,
}

/// Measured latencies in trial order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Samples(Vec<Duration>);

impl Samples {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Duration> {
        self.0.iter()
    }

    /// Whole nanoseconds per trial
    pub fn nanos(&self) -> impl Iterator<Item = u128> + '_ {
        self.0.iter().map(Duration::as_nanos)
    }

    pub fn into_inner(self) -> Vec<Duration> {
        self.0
    }
}

impl From<Vec<Duration>> for Samples {
    fn from(samples: Vec<Duration>) -> Self {
        Self(samples)
    }
}

/// Drives an output and times a detector over a fixed delay schedule
pub struct MeasurementLoop<O, D> {
    output: O,
    detector: D,
    delays: Vec<Duration>,
    state: LoopState,
}

impl<O: OutputSignal, D: Detector> MeasurementLoop<O, D> {
    /// Drive the output to its deasserted level and get ready to run.
    ///
    /// Runs one trial per entry in `delays`.
    pub fn initialize(mut output: O, detector: D, delays: Vec<Duration>) -> Self {
        output.deassert();
        debug!("Measurement loop initialized for {} trial(s)", delays.len());
        Self {
            output,
            detector,
            delays,
            state: LoopState::Initialized,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn trials(&self) -> usize {
        self.delays.len()
    }

    /// Run every trial and return the samples.
    ///
    /// Blocks until all trials complete; a backend that never sees its
    /// transition blocks forever.
    pub fn run(&mut self) -> Samples {
        info!("Running {} trial(s)", self.delays.len());
        let mut samples = Vec::with_capacity(self.delays.len());

        for (i, delay) in self.delays.iter().enumerate() {
            self.state = LoopState::Running(i);
            thread::sleep(*delay);

            let start = Instant::now();
            self.output.assert();
            self.detector.await_state(true);
            samples.push(start.elapsed());

            self.output.deassert();
            self.detector.await_state(false);
        }

        self.state = LoopState::Done;
        debug!("Measurement loop done");
        Samples(samples)
    }

    /// Give back the output and detector
    pub fn into_parts(self) -> (O, D) {
        (self.output, self.detector)
    }
}

/// Generate the delay schedule for `config` and run a full measurement.
///
/// `output` and `detector` must already be claimed; the output is driven
/// deasserted before the first trial.
pub fn measure<O, D>(output: O, detector: D, config: &RunConfig) -> Result<Samples, DelayError>
where
    O: OutputSignal,
    D: Detector,
{
    let delays = delay::generate(
        config.iterations as usize,
        config.delay_min_us,
        config.delay_max_us,
        config.seed,
    )?;
    let mut ml = MeasurementLoop::initialize(output, detector, delays);
    Ok(ml.run())
}
