//! Output of measurement results
//!
//! Samples go to stdout as one integer nanosecond count per line, in trial
//! order, with nothing else around them. The optional summary is a single
//! JSON line describing the run.

use crate::config::{Backend, Mode, RunConfig};
use crate::measure::Samples;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// One-line description of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub iterations: u32,
    pub delay_min: u64,
    pub delay_max: u64,
    pub pin: bool,
    pub usb: Option<u32>,
    pub key: Option<u16>,
}

impl From<&RunConfig> for Summary {
    fn from(config: &RunConfig) -> Self {
        let (pin, usb, key) = match config.mode {
            Mode::Measure(Backend::Pin) => (true, None, None),
            Mode::Measure(Backend::Usb { device, key }) => (false, Some(device), Some(key)),
            Mode::ListDevices => (false, None, None),
        };
        Self {
            iterations: config.iterations,
            delay_min: config.delay_min_us,
            delay_max: config.delay_max_us,
            pin,
            usb,
            key,
        }
    }
}

impl Summary {
    /// Compact JSON, no trailing newline
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Write the summary followed by a newline
    pub fn write_line<W: Write>(&self, mut w: W) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(w, "{}", json)
    }
}

/// Write one nanosecond count per line
pub fn write_samples<W: Write>(w: W, samples: &Samples) -> io::Result<()> {
    let mut w = io::BufWriter::new(w);
    for nanos in samples.nanos() {
        writeln!(w, "{}", nanos)?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EvdevConfig, GpioConfig};
    use std::time::Duration;

    fn run_config(mode: Mode) -> RunConfig {
        RunConfig {
            iterations: 1000,
            delay_min_us: 10_000,
            delay_max_us: 20_000,
            seed: 1,
            mode,
            summary: true,
            gpio: GpioConfig::default(),
            evdev: EvdevConfig::default(),
        }
    }

    #[test]
    fn pin_summary_line() {
        let summary = Summary::from(&run_config(Mode::Measure(Backend::Pin)));
        assert_eq!(
            summary.to_json().unwrap(),
            r#"{"iterations":1000,"delay_min":10000,"delay_max":20000,"pin":true,"usb":null,"key":null}"#
        );
    }

    #[test]
    fn usb_summary_line() {
        let summary = Summary::from(&run_config(Mode::Measure(Backend::Usb { device: 3, key: 30 })));
        let mut out = Vec::new();
        summary.write_line(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"iterations\":1000,\"delay_min\":10000,\"delay_max\":20000,\"pin\":false,\"usb\":3,\"key\":30}\n"
        );
    }

    #[test]
    fn samples_one_per_line() {
        let samples = Samples::from(vec![
            Duration::from_nanos(12_345),
            Duration::from_nanos(0),
            Duration::from_micros(7),
        ]);
        let mut out = Vec::new();
        write_samples(&mut out, &samples).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "12345\n0\n7000\n");
    }

    #[test]
    fn no_samples_no_output() {
        let mut out = Vec::new();
        write_samples(&mut out, &Samples::default()).unwrap();
        assert!(out.is_empty());
    }
}
