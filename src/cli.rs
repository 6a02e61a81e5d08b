//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Measure switch latency between a GPIO output and a GPIO input or evdev key
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "switch-latency")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of iterations to perform (default: 1000)
    #[arg(short, long, allow_negative_numbers = true)]
    pub iterations: Option<i64>,

    /// Minimum delay between measurements in microseconds (default: 10000)
    #[arg(short = 'd', long = "delaymin", allow_negative_numbers = true)]
    pub delay_min: Option<i64>,

    /// Maximum delay between measurements in microseconds (default: 20000)
    #[arg(short = 'D', long = "delaymax", allow_negative_numbers = true)]
    pub delay_max: Option<i64>,

    /// Run pin-based measurement
    #[arg(short, long)]
    pub pin: bool,

    /// Run usb-based measurement. Pass an evdev event id
    #[arg(short, long, value_name = "EVENT_ID", allow_negative_numbers = true)]
    pub usb: Option<i64>,

    /// Event code of the key used for measurement. See kernel 'input-event-codes.h'
    #[arg(short, long, value_name = "EVENT_CODE", allow_negative_numbers = true)]
    pub key: Option<i64>,

    /// List names of evdev events
    #[arg(short, long)]
    pub events: bool,

    /// Print a one-line JSON summary of the configuration before measuring
    #[arg(short, long)]
    pub summary: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from([
            "switch-latency", "-i", "10", "-d", "5", "-D", "6", "-u", "2", "-k", "30", "-s",
        ])
        .unwrap();
        assert_eq!(cli.iterations, Some(10));
        assert_eq!(cli.delay_min, Some(5));
        assert_eq!(cli.delay_max, Some(6));
        assert_eq!(cli.usb, Some(2));
        assert_eq!(cli.key, Some(30));
        assert!(cli.summary);
        assert!(!cli.pin);
    }

    #[test]
    fn parses_long_flags() {
        let cli = Cli::try_parse_from([
            "switch-latency",
            "--iterations",
            "3",
            "--delaymin",
            "1",
            "--delaymax",
            "2",
            "--pin",
            "--config",
            "/tmp/x.toml",
        ])
        .unwrap();
        assert_eq!(cli.iterations, Some(3));
        assert!(cli.pin);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
    }

    #[test]
    fn non_numeric_value_is_parse_error() {
        assert!(Cli::try_parse_from(["switch-latency", "-i", "many"]).is_err());
    }

    #[test]
    fn help_is_display_help() {
        let err = Cli::try_parse_from(["switch-latency", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
