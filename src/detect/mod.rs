//! Detection backends
//!
//! A backend blocks the calling thread until the far end of the circuit
//! reports the requested state. Both variants spin without sleeping, since any
//! backoff would show up in the measured latency.

mod key;
mod pin;

pub use key::{EventSource, InputEvent, KeyDetector};
#[cfg(target_os = "linux")]
pub use key::{key_name, EventReader};
pub use pin::{LevelInput, PinDetector};

/// Blocks until an externally observed state matches the target
pub trait Detector {
    /// Wait until the observed state equals `asserted`.
    ///
    /// There is no timeout: if the transition never happens this never returns.
    fn await_state(&mut self, asserted: bool);
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn await_state(&mut self, asserted: bool) {
        (**self).await_state(asserted)
    }
}
