//! Linux fbdev display source.
//!
//! # How the framebuffer is read (for beginners)
//!
//! The kernel exposes the panel's video memory as a character device,
//! usually `/dev/fb0`.  Three calls are enough to read it:
//!
//! 1. `open(path, O_RDONLY)`.
//! 2. `ioctl(fd, FBIOGET_VSCREENINFO, &mut fb_var_screeninfo)`, which
//!    fills in the resolution, the bits per pixel and where each colour
//!    channel sits inside a pixel word.
//! 3. `mmap(.., PROT_READ, MAP_SHARED, fd, 0)`, which maps the video memory
//!    into our address space.  The hardware keeps updating it; we only ever
//!    read it.
//!
//! The mapping is never handed out as a slice.  Each [`DisplaySource::frame`]
//! call copies it through the raw pointer into a staging buffer, and the
//! differ works on that snapshot.
//!
//! The mapping covers `xres * yres * bits_per_pixel / 8` bytes.  Panels
//! with padded rows (`line_length` larger than a packed row) are not
//! handled.
//!
//! [`LinuxFramebuffer`] unmaps and closes the device in `Drop`, so every
//! exit path releases it.

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use fbmirror_core::{ChannelLayout, DisplayGeometry, FormatError, PixelFormatDescriptor, Rotation};
use tracing::info;

use super::{DeviceError, DisplaySource};

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;

// ── Kernel ABI ────────────────────────────────────────────────────────────────

/// `struct fb_bitfield` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

impl FbVarScreeninfo {
    fn pixel_format(&self) -> PixelFormatDescriptor {
        PixelFormatDescriptor::new(
            self.bits_per_pixel,
            ChannelLayout::new(self.red.offset, self.red.length),
            ChannelLayout::new(self.green.offset, self.green.length),
            ChannelLayout::new(self.blue.offset, self.blue.length),
        )
    }
}

// ── LinuxFramebuffer ──────────────────────────────────────────────────────────

/// A read-only mapping of an fbdev device.
#[derive(Debug)]
pub struct LinuxFramebuffer {
    path: PathBuf,
    // Held so the descriptor outlives the mapping.
    _file: File,
    map: NonNull<u8>,
    len: usize,
    staging: Vec<u8>,
    geometry: DisplayGeometry,
}

// SAFETY: the mapping is read-only, owned exclusively by this handle and
// valid until `Drop`; moving the handle to another thread moves that
// ownership with it.
unsafe impl Send for LinuxFramebuffer {}

impl LinuxFramebuffer {
    /// Opens `path`, queries its geometry and maps it.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if the device cannot be opened, queried or
    /// mapped, or reports an empty resolution.
    pub fn open(path: &Path, rotation: Rotation) -> Result<Self, DeviceError> {
        let file = File::open(path).map_err(|source| DeviceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let fd = file.as_raw_fd();

        let mut vinfo = FbVarScreeninfo::default();
        // SAFETY: `fd` is an open descriptor and `vinfo` is a correctly laid
        // out `fb_var_screeninfo` the kernel fills in.
        let rc = unsafe { libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &mut vinfo as *mut FbVarScreeninfo) };
        if rc != 0 {
            return Err(DeviceError::Ioctl {
                path: path.to_path_buf(),
                request: "FBIOGET_VSCREENINFO",
                source: io::Error::last_os_error(),
            });
        }
        if vinfo.xres == 0 || vinfo.yres == 0 {
            return Err(FormatError::EmptyGeometry {
                width: vinfo.xres,
                height: vinfo.yres,
            }
            .into());
        }

        let geometry = DisplayGeometry::new(vinfo.xres, vinfo.yres, vinfo.pixel_format(), rotation);
        let framebuffer = Self::map(path, file, geometry)?;

        info!(
            "framebuffer {}: {}x{} {} bpp, r{}/{} g{}/{} b{}/{}, rotation {rotation}",
            path.display(),
            vinfo.xres,
            vinfo.yres,
            vinfo.bits_per_pixel,
            vinfo.red.offset,
            vinfo.red.length,
            vinfo.green.offset,
            vinfo.green.length,
            vinfo.blue.offset,
            vinfo.blue.length,
        );
        Ok(framebuffer)
    }

    /// Maps one frame of `file` read-only.
    fn map(path: &Path, file: File, geometry: DisplayGeometry) -> Result<Self, DeviceError> {
        let len = geometry.frame_size();

        // SAFETY: a fresh read-only shared mapping of `len` bytes; the result
        // is checked against MAP_FAILED before use.
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(DeviceError::Mmap {
                path: path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }
        let Some(map) = NonNull::new(addr.cast::<u8>()) else {
            return Err(DeviceError::Mmap {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "mmap returned null"),
            });
        };

        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
            map,
            len,
            staging: vec![0; len],
            geometry,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySource for LinuxFramebuffer {
    fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    fn frame(&mut self) -> &[u8] {
        // SAFETY: `map` points at `len` readable bytes for as long as `self`
        // lives and `staging` holds exactly `len` bytes.  The two regions
        // never overlap.
        unsafe {
            std::ptr::copy_nonoverlapping(self.map.as_ptr(), self.staging.as_mut_ptr(), self.len);
        }
        &self.staging
    }
}

impl Drop for LinuxFramebuffer {
    fn drop(&mut self) {
        // SAFETY: `map`/`len` are exactly what `mmap` returned and nothing
        // borrows the mapping once `self` is being dropped.
        unsafe {
            libc::munmap(self.map.as_ptr().cast(), self.len);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
