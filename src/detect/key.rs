//! Evdev key event detection
//!
//! Reads raw `struct input_event` records from a non-blocking event device and
//! waits for a specific key to reach the pressed or released state.

use super::Detector;

/// Event type for key and button state changes
pub const EV_KEY: u16 = 0x01;

/// Key state as reported in `InputEvent::value`
const KEY_RELEASED: i32 = 0;
const KEY_PRESSED: i32 = 1;

/// An input event with the kernel timestamp stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            event_type,
            code,
            value,
        }
    }

    /// Key event helper
    pub fn key(code: u16, pressed: bool) -> Self {
        Self::new(EV_KEY, code, if pressed { KEY_PRESSED } else { KEY_RELEASED })
    }

    /// True if this is `key` going to the given state. Autorepeat (value 2) never matches.
    pub fn is_key_state(&self, key: u16, pressed: bool) -> bool {
        let wanted = if pressed { KEY_PRESSED } else { KEY_RELEASED };
        self.event_type == EV_KEY && self.code == key && self.value == wanted
    }
}

/// Source of input events that never blocks
pub trait EventSource {
    /// Next pending event, or `None` if nothing could be read right now.
    ///
    /// Read errors are reported as `None` as well; callers simply poll again.
    fn next_event(&mut self) -> Option<InputEvent>;
}

/// Spins on an event source until the configured key reaches the target state
pub struct KeyDetector<S> {
    source: S,
    key: u16,
}

impl<S: EventSource> KeyDetector<S> {
    pub fn new(source: S, key: u16) -> Self {
        Self { source, key }
    }

    pub fn key(&self) -> u16 {
        self.key
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: EventSource> Detector for KeyDetector<S> {
    fn await_state(&mut self, asserted: bool) {
        loop {
            match self.source.next_event() {
                Some(event) if event.is_key_state(self.key, asserted) => return,
                _ => std::hint::spin_loop(),
            }
        }
    }
}

/// Kernel name for a key code, e.g. `KEY_A` for 30
#[cfg(target_os = "linux")]
pub fn key_name(code: u16) -> String {
    format!("{:?}", evdev::Key::new(code))
}

#[cfg(target_os = "linux")]
pub use reader::EventReader;

#[cfg(target_os = "linux")]
mod reader {
    use super::{EventSource, InputEvent};
    use nix::libc;
    use std::io::Read;

    /// Kernel `struct input_event` layout for the build target
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct RawInputEvent {
        time: libc::timeval,
        event_type: u16,
        code: u16,
        value: i32,
    }

    const INPUT_EVENT_SIZE: usize = std::mem::size_of::<RawInputEvent>();

    /// Reads one `input_event` record per call from a non-blocking reader
    pub struct EventReader<R> {
        inner: R,
        buffer: [u8; INPUT_EVENT_SIZE],
    }

    impl<R: Read> EventReader<R> {
        pub fn new(inner: R) -> Self {
            Self {
                inner,
                buffer: [0u8; INPUT_EVENT_SIZE],
            }
        }

        /// Size in bytes of a single record
        pub const fn record_size() -> usize {
            INPUT_EVENT_SIZE
        }

        pub fn get_ref(&self) -> &R {
            &self.inner
        }
    }

    impl<R: Read> EventSource for EventReader<R> {
        fn next_event(&mut self) -> Option<InputEvent> {
            match self.inner.read(&mut self.buffer) {
                Ok(n) if n == INPUT_EVENT_SIZE => {
                    // SAFETY: the buffer holds exactly one record and every
                    // bit pattern is a valid RawInputEvent.
                    let raw: RawInputEvent = unsafe {
                        std::ptr::read_unaligned(self.buffer.as_ptr() as *const RawInputEvent)
                    };
                    Some(InputEvent::new(raw.event_type, raw.code, raw.value))
                }
                // Short read, EAGAIN or any other error: nothing usable yet
                _ => None,
            }
        }
    }

    /// Encode an event the way the kernel lays it out
    #[cfg(test)]
    pub(crate) fn encode(event: InputEvent) -> Vec<u8> {
        // SAFETY: timeval is plain integers, zero is a valid value.
        let mut raw: RawInputEvent = unsafe { std::mem::zeroed() };
        raw.event_type = event.event_type;
        raw.code = event.code;
        raw.value = event.value;
        let bytes = unsafe {
            std::slice::from_raw_parts(&raw as *const RawInputEvent as *const u8, INPUT_EVENT_SIZE)
        };
        bytes.to_vec()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Event source that replays a script; `None` entries model empty reads
    struct Script {
        events: VecDeque<Option<InputEvent>>,
        polls: usize,
    }

    impl Script {
        fn new(events: Vec<Option<InputEvent>>) -> Self {
            Self {
                events: events.into(),
                polls: 0,
            }
        }
    }

    impl EventSource for Script {
        fn next_event(&mut self) -> Option<InputEvent> {
            self.polls += 1;
            self.events.pop_front().flatten()
        }
    }

    #[test]
    fn key_state_matching() {
        assert!(InputEvent::key(30, true).is_key_state(30, true));
        assert!(InputEvent::key(30, false).is_key_state(30, false));
        assert!(!InputEvent::key(30, true).is_key_state(30, false));
        assert!(!InputEvent::key(31, true).is_key_state(30, true));
        assert!(!InputEvent::new(0x04, 30, 1).is_key_state(30, true));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn key_names_from_kernel_table() {
        assert!(key_name(30).contains("KEY_A"));
        assert!(key_name(57).contains("KEY_SPACE"));
    }

    #[test]
    fn autorepeat_does_not_count_as_press() {
        assert!(!InputEvent::new(EV_KEY, 30, 2).is_key_state(30, true));
    }

    #[test]
    fn returns_only_after_matching_event() {
        let mut script = vec![
            Some(InputEvent::new(0x04, 4, 458756)), // EV_MSC scan code
            None,
            Some(InputEvent::key(31, true)),
            Some(InputEvent::key(30, false)),
            Some(InputEvent::new(EV_KEY, 30, 2)),
            None,
            Some(InputEvent::new(0, 0, 0)),
        ];
        let noise = script.len();
        script.push(Some(InputEvent::key(30, true)));
        script.push(Some(InputEvent::new(0, 0, 0)));

        let mut det = KeyDetector::new(Script::new(script), 30);
        det.await_state(true);

        let source = det.into_inner();
        assert_eq!(source.polls, noise + 1);
        assert_eq!(source.events.len(), 1);
    }

    #[test]
    fn release_waits_for_value_zero() {
        let script = vec![
            Some(InputEvent::key(30, true)),
            Some(InputEvent::new(EV_KEY, 30, 2)),
            Some(InputEvent::key(30, false)),
        ];
        let mut det = KeyDetector::new(Script::new(script), 30);
        det.await_state(false);
        assert!(det.into_inner().events.is_empty());
    }

    #[test]
    fn press_then_release_in_sequence() {
        let script = vec![
            None,
            Some(InputEvent::key(30, true)),
            Some(InputEvent::new(0, 0, 0)),
            None,
            None,
            Some(InputEvent::key(30, false)),
        ];
        let mut det = KeyDetector::new(Script::new(script), 30);
        assert_eq!(det.key(), 30);
        det.await_state(true);
        det.await_state(false);
        assert_eq!(det.into_inner().polls, 6);
    }
}
