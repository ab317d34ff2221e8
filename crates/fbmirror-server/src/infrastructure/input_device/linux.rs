//! Linux evdev input sink.
//!
//! # What is evdev? (for beginners)
//!
//! Every input device on Linux appears as `/dev/input/eventN`.  Reading one
//! yields `struct input_event` records; *writing* records to it makes the
//! kernel deliver them to everyone reading the device, exactly as if the
//! hardware had produced them.  That is how the remote viewer's keys and
//! taps reach the panel's UI.
//!
//! Each record is `{timestamp, type, code, value}`:
//!
//! | type        | code              | value                      |
//! |-------------|-------------------|----------------------------|
//! | `EV_KEY`    | key or `BTN_TOUCH`| 1 down, 0 up               |
//! | `EV_ABS`    | `ABS_X`, `ABS_MT_*`| coordinate or tracking id |
//! | `EV_MSC`    | `MSC_SCAN`        | raw scan code              |
//! | `EV_SYN`    | `SYN_REPORT`      | 0, ends a packet           |
//!
//! The touch device also reports the range of its axes through the
//! `EVIOCGABS(axis)` ioctl; those ranges become the valid pointer rectangle.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fbmirror_core::keymap::evdev;
use fbmirror_core::{InputEvent, InputSink, SinkError, TouchBounds};
use tracing::{debug, info};

use crate::infrastructure::DeviceError;

/// `EVIOCGABS(axis)`: `_IOR('E', 0x40 + axis, struct input_absinfo)`.
const fn eviocgabs(axis: u16) -> libc::c_ulong {
    const IOC_READ: libc::c_ulong = 2;
    let size = std::mem::size_of::<libc::input_absinfo>() as libc::c_ulong;
    (IOC_READ << 30) | (size << 16) | ((b'E' as libc::c_ulong) << 8) | (0x40 + axis as libc::c_ulong)
}

/// A writable evdev node.  Closed when dropped.
#[derive(Debug)]
pub struct EvdevSink {
    path: PathBuf,
    file: File,
}

impl EvdevSink {
    /// Opens `path` for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Open`] if the node cannot be opened.
    pub fn open(path: &Path) -> Result<Self, DeviceError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        info!("input device {} opened", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queries the X and Y ranges the device reports.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Ioctl`] if either query fails.
    pub fn abs_bounds(&self) -> Result<TouchBounds, DeviceError> {
        let x = self.abs_info(evdev::ABS_X, "EVIOCGABS(ABS_X)")?;
        let y = self.abs_info(evdev::ABS_Y, "EVIOCGABS(ABS_Y)")?;
        let bounds = TouchBounds::new(x.minimum, x.maximum, y.minimum, y.maximum);
        info!(
            "touch range x:({} {}) y:({} {})",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
        );
        Ok(bounds)
    }

    fn abs_info(&self, axis: u16, request: &'static str) -> Result<libc::input_absinfo, DeviceError> {
        // SAFETY: `input_absinfo` is plain old data; all-zero is a valid value.
        let mut info: libc::input_absinfo = unsafe { std::mem::zeroed() };
        // SAFETY: the descriptor is open for the lifetime of `self` and
        // `info` has the layout EVIOCGABS writes.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                eviocgabs(axis) as _,
                &mut info as *mut libc::input_absinfo,
            )
        };
        if rc != 0 {
            return Err(DeviceError::Ioctl {
                path: self.path.clone(),
                request,
                source: io::Error::last_os_error(),
            });
        }
        Ok(info)
    }
}

/// Builds the kernel record for `event`, stamped with the current time.
fn to_raw(event: &InputEvent) -> libc::input_event {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    libc::input_event {
        time: libc::timeval {
            tv_sec: now.as_secs() as libc::time_t,
            tv_usec: now.subsec_micros() as libc::suseconds_t,
        },
        type_: event.kind,
        code: event.code,
        value: event.value,
    }
}

impl InputSink for EvdevSink {
    fn write_event(&self, event: &InputEvent) -> Result<(), SinkError> {
        let raw = to_raw(event);
        let expected = std::mem::size_of::<libc::input_event>();
        // SAFETY: `raw` is a fully initialised `repr(C)` struct; viewing it
        // as `expected` bytes reads nothing out of bounds.
        let bytes = unsafe {
            std::slice::from_raw_parts((&raw as *const libc::input_event).cast::<u8>(), expected)
        };
        let written = (&self.file).write(bytes)?;
        if written != expected {
            return Err(SinkError::ShortWrite { written, expected });
        }
        debug!(
            "{}: type {} code {} value {}",
            self.path.display(),
            event.kind,
            event.code,
            event.value
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
