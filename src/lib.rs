//! switch-latency - GPIO and evdev switch latency measurement
//!
//! Toggles a GPIO output and times how long the change takes to show up on a
//! GPIO input or as an evdev key event. Samples are reported raw, one per
//! trial, for external analysis.

pub mod cli;
pub mod config;
pub mod delay;
pub mod detect;
#[cfg(target_os = "linux")]
pub mod devices;
pub mod gpio;
pub mod measure;
pub mod report;

pub use cli::Cli;
pub use config::{Backend, Config, Mode, RunConfig};
pub use measure::{measure, MeasurementLoop, Samples};
