//! switch-latency - measure switch response latency on embedded Linux boards
//!
//! Samples are written to stdout, one nanosecond count per line. Logging goes
//! to stderr so the output can be piped straight into analysis tools.

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::{debug, info};
use std::io::{self, Write};
use std::process::ExitCode;

use switch_latency::{
    config::{Config, Mode, RunConfig},
    report::Summary,
    Cli,
};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            eprintln!();
            let _ = Cli::command().write_help(&mut io::stderr());
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let file = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    debug!("File config: {:?}", file);
    let config = RunConfig::resolve(cli, &file)?;
    Ok(config)
}

fn run(config: &RunConfig) -> Result<()> {
    let backend = match config.mode {
        Mode::ListDevices => return list_devices(config),
        Mode::Measure(backend) => backend,
    };

    if config.summary {
        let stdout = io::stdout();
        Summary::from(config).write_line(stdout.lock())?;
    }

    let samples = measure::run_backend(config, backend)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    switch_latency::report::write_samples(&mut out, &samples).context("Failed to write samples")?;
    out.flush()?;
    info!("Wrote {} sample(s)", samples.len());
    Ok(())
}

#[cfg(target_os = "linux")]
fn list_devices(config: &RunConfig) -> Result<()> {
    let entries =
        switch_latency::devices::list_devices(&config.evdev.device_dir, config.evdev.max_devices);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in entries {
        writeln!(out, "{}", entry)?;
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn list_devices(_config: &RunConfig) -> Result<()> {
    anyhow::bail!("Listing evdev devices requires Linux")
}

#[cfg(target_os = "linux")]
mod measure {
    use anyhow::{Context, Result};
    use log::info;
    use switch_latency::{
        config::{Backend, RunConfig},
        detect::{key_name, EventReader, KeyDetector, PinDetector},
        devices::EventDevice,
        gpio::{self, Pins},
        Samples,
    };

    pub fn run_backend(config: &RunConfig, backend: Backend) -> Result<Samples> {
        match backend {
            Backend::Pin => {
                let pins = Pins::new(&config.gpio)?;
                let output = pins.output()?;
                let input = pins.input()?;
                info!("Pin measurement: {}", gpio::describe(&config.gpio));
                let samples = switch_latency::measure(output, PinDetector::new(input), config)?;
                Ok(samples)
            }
            Backend::Usb { device, key } => {
                let event = EventDevice::open(&config.evdev.device_dir, device)?;
                info!(
                    "USB measurement: [{}] {} waiting for {}",
                    event.id(),
                    event.name(),
                    key_name(key)
                );
                let pins = Pins::new(&config.gpio)?;
                let output = pins.output().context("Failed to claim output pin")?;
                let detector = KeyDetector::new(EventReader::new(event), key);
                let samples = switch_latency::measure(output, detector, config)?;
                Ok(samples)
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod measure {
    use anyhow::Result;
    use switch_latency::{config::Backend, RunConfig, Samples};

    pub fn run_backend(_config: &RunConfig, _backend: Backend) -> Result<Samples> {
        anyhow::bail!("GPIO and evdev measurement require Linux")
    }
}
