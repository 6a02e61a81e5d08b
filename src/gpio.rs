//! GPIO output signal and pin setup
//!
//! Pins use BCM numbering. The defaults match the usual wiringPi rig: output on
//! BCM 27 (wiringPi 2) and input on BCM 17 (wiringPi 0), with the switch
//! pulling the input to ground when closed.

use crate::config::GpioConfig;
use thiserror::Error;

/// Output line that triggers the device under test
pub trait OutputSignal {
    /// Drive the output to the asserted (HIGH) level
    fn assert(&mut self);
    /// Drive the output to the deasserted (LOW) level
    fn deassert(&mut self);
}

impl<O: OutputSignal + ?Sized> OutputSignal for Box<O> {
    fn assert(&mut self) {
        (**self).assert()
    }

    fn deassert(&mut self) {
        (**self).deassert()
    }
}

/// Error type for GPIO setup
#[derive(Debug, Error)]
pub enum GpioError {
    /// The GPIO peripheral could not be opened
    #[error("GPIO unavailable: {0}")]
    Unavailable(String),
    /// A pin could not be claimed
    #[error("could not claim GPIO pin {pin}: {reason}")]
    Pin { pin: u8, reason: String },
}

#[cfg(target_os = "linux")]
pub use hw::Pins;

#[cfg(target_os = "linux")]
mod hw {
    use super::{GpioError, OutputSignal};
    use crate::config::GpioConfig;
    use log::debug;
    use rppal::gpio::{Gpio, InputPin, OutputPin};

    impl OutputSignal for OutputPin {
        #[inline]
        fn assert(&mut self) {
            self.set_high();
        }

        #[inline]
        fn deassert(&mut self) {
            self.set_low();
        }
    }

    /// Pin setup on the host GPIO controller
    pub struct Pins {
        gpio: Gpio,
        config: GpioConfig,
    }

    impl Pins {
        pub fn new(config: &GpioConfig) -> Result<Self, GpioError> {
            let gpio = Gpio::new().map_err(|e| GpioError::Unavailable(e.to_string()))?;
            Ok(Self {
                gpio,
                config: config.clone(),
            })
        }

        /// Claim the output pin, driven LOW
        pub fn output(&self) -> Result<OutputPin, GpioError> {
            let pin = self.config.output_pin;
            let mut out = self
                .gpio
                .get(pin)
                .map_err(|e| GpioError::Pin {
                    pin,
                    reason: e.to_string(),
                })?
                .into_output_low();
            // Leave the line LOW after exit instead of restoring its old mode
            out.set_reset_on_drop(false);
            debug!("Output pin BCM {} driven low", pin);
            Ok(out)
        }

        /// Claim the input pin with its pull-up enabled
        pub fn input(&self) -> Result<InputPin, GpioError> {
            let pin = self.config.input_pin;
            let input = self
                .gpio
                .get(pin)
                .map_err(|e| GpioError::Pin {
                    pin,
                    reason: e.to_string(),
                })?
                .into_input_pullup();
            debug!("Input pin BCM {} configured with pull-up", pin);
            Ok(input)
        }
    }
}

/// Describe the pin pair for log output
pub fn describe(config: &GpioConfig) -> String {
    format!(
        "output BCM {} -> input BCM {} (active low)",
        config.output_pin, config.input_pin
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        levels: Vec<bool>,
    }

    impl OutputSignal for Recorder {
        fn assert(&mut self) {
            self.levels.push(true);
        }

        fn deassert(&mut self) {
            self.levels.push(false);
        }
    }

    #[test]
    fn boxed_output_forwards() {
        let mut boxed: Box<Recorder> = Box::default();
        boxed.assert();
        boxed.deassert();
        assert_eq!(boxed.levels, vec![true, false]);
    }

    #[test]
    fn describe_default_pins() {
        let text = describe(&GpioConfig::default());
        assert_eq!(text, "output BCM 27 -> input BCM 17 (active low)");
    }

    #[test]
    fn gpio_error_display() {
        let err = GpioError::Pin {
            pin: 17,
            reason: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "could not claim GPIO pin 17: busy");
    }
}
