//! Evdev character devices
//!
//! Opens `/dev/input/event<N>` nodes for measurement and lists the nodes that
//! are present together with their driver-reported names.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of the buffer handed to the name query; longer names are truncated
pub const NAME_BUFFER_LEN: usize = 256;

/// Error type for event device access
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Device node could not be opened
    #[error("Could not open {} for event id {id}: {source}", path.display())]
    Open {
        id: u32,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A device that can report a human-readable name
pub trait NamedDevice {
    /// Copy the device name into `buf`, returning the number of bytes written.
    fn query_name(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Path of the event node with the given id
pub fn event_path(dir: &Path, id: u32) -> PathBuf {
    dir.join(format!("event{}", id))
}

/// An open, non-blocking event device. The descriptor is closed on drop.
#[derive(Debug)]
pub struct EventDevice {
    file: File,
    id: u32,
}

impl EventDevice {
    /// Open `<dir>/event<id>` read-only and non-blocking
    pub fn open(dir: &Path, id: u32) -> Result<Self, DeviceError> {
        use nix::libc;
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let path = event_path(dir, id);
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| DeviceError::Open { id, path, source })?;

        Ok(Self { file, id })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Driver-reported name, truncated to [`NAME_BUFFER_LEN`] bytes
    pub fn name(&self) -> String {
        device_name(self)
    }
}

impl Read for EventDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

nix::ioctl_read_buf!(eviocgname, b'E', 0x06, u8);

impl NamedDevice for EventDevice {
    fn query_name(&self, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::io::AsRawFd;

        // SAFETY: the descriptor is open for the lifetime of `self` and the
        // kernel writes at most `buf.len()` bytes.
        let written = unsafe { eviocgname(self.file.as_raw_fd(), buf) }.map_err(io::Error::from)?;
        Ok(written.max(0) as usize)
    }
}

/// Query a device name through a fixed-size buffer.
///
/// A failed query gives an empty name. Decoding stops at the first NUL or at
/// the end of the buffer, whichever comes first.
pub fn device_name<D: NamedDevice + ?Sized>(device: &D) -> String {
    let mut buf = [0u8; NAME_BUFFER_LEN];
    let len = match device.query_name(&mut buf) {
        Ok(n) => n.min(NAME_BUFFER_LEN),
        Err(_) => 0,
    };
    let bytes = &buf[..len];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// One discovered event device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub id: u32,
    pub name: String,
}

impl std::fmt::Display for DeviceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.name)
    }
}

/// Try every id in `ids`, skipping those that fail to open.
///
/// Each handle is dropped before the next id is tried.
pub fn enumerate<D, F, I>(ids: I, mut open: F) -> Vec<DeviceEntry>
where
    D: NamedDevice,
    F: FnMut(u32) -> io::Result<D>,
    I: IntoIterator<Item = u32>,
{
    let mut entries = Vec::new();
    for id in ids {
        let device = match open(id) {
            Ok(device) => device,
            Err(_) => continue,
        };
        entries.push(DeviceEntry {
            id,
            name: device_name(&device),
        });
    }
    entries
}

/// List event devices `0..max` under `dir`
pub fn list_devices(dir: &Path, max: u32) -> Vec<DeviceEntry> {
    let entries = enumerate(0..max, |id| {
        EventDevice::open(dir, id).map_err(|DeviceError::Open { source, .. }| source)
    });
    log::debug!("Found {} event device(s) under {}", entries.len(), dir.display());
    entries
}
