//! GPIO input detection

use super::Detector;

/// A digital input that can report its current level
pub trait LevelInput {
    /// True when the line reads logic LOW
    fn is_low(&self) -> bool;
}

#[cfg(target_os = "linux")]
impl LevelInput for rppal::gpio::InputPin {
    #[inline]
    fn is_low(&self) -> bool {
        rppal::gpio::InputPin::is_low(self)
    }
}

/// Busy-polls an input pin wired active-low (pressed pulls the line LOW)
pub struct PinDetector<I> {
    input: I,
}

impl<I: LevelInput> PinDetector<I> {
    pub fn new(input: I) -> Self {
        Self { input }
    }

    pub fn into_inner(self) -> I {
        self.input
    }
}

impl<I: LevelInput> Detector for PinDetector<I> {
    fn await_state(&mut self, asserted: bool) {
        while self.input.is_low() != asserted {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Input that reports HIGH for a number of reads, then LOW, then HIGH again
    struct ScriptedInput {
        levels: Vec<bool>,
        reads: Cell<usize>,
    }

    impl ScriptedInput {
        fn new(levels: Vec<bool>) -> Self {
            Self {
                levels,
                reads: Cell::new(0),
            }
        }
    }

    impl LevelInput for ScriptedInput {
        fn is_low(&self) -> bool {
            let i = self.reads.get();
            self.reads.set(i + 1);
            self.levels[i.min(self.levels.len() - 1)]
        }
    }

    #[test]
    fn asserted_waits_for_low() {
        let mut det = PinDetector::new(ScriptedInput::new(vec![false, false, false, true]));
        det.await_state(true);
        assert_eq!(det.into_inner().reads.get(), 4);
    }

    #[test]
    fn deasserted_waits_for_high() {
        let mut det = PinDetector::new(ScriptedInput::new(vec![true, true, false]));
        det.await_state(false);
        assert_eq!(det.into_inner().reads.get(), 3);
    }

    #[test]
    fn returns_immediately_when_already_at_level() {
        let mut det = PinDetector::new(ScriptedInput::new(vec![true]));
        det.await_state(true);
        assert_eq!(det.into_inner().reads.get(), 1);
    }

    #[test]
    fn full_press_release_cycle() {
        let mut det = PinDetector::new(ScriptedInput::new(vec![
            false, false, true, true, true, false,
        ]));
        det.await_state(true);
        det.await_state(false);
        assert_eq!(det.into_inner().reads.get(), 6);
    }
}
