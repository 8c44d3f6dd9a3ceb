//! Linux framebuffer device (`/dev/fb*`).
//!
//! # Acquisition
//!
//! 1. Open the device node read/write
//! 2. `FBIOGET_FSCREENINFO`: line length in bytes
//! 3. `FBIOGET_VSCREENINFO`: visible resolution and color depth
//! 4. `mmap(MAP_SHARED)` of `line_length * yres` bytes
//!
//! Each step has its own [`DeviceError`] variant. Nothing is retried: a missing
//! or unusable display cannot be worked around at this layer.
//!
//! Only 16 bits per pixel is supported. The mapping is unmapped on drop; the
//! file descriptor closes with the `File`.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::ptr;

use libc::{c_ulong, c_void};

use super::device::{FrameDevice, ScreenInfo};
use crate::error::DeviceError;

const FBIOGET_VSCREENINFO: c_ulong = 0x4600;
const FBIOGET_FSCREENINFO: c_ulong = 0x4602;

// =============================================================================
// Kernel ABI (linux/fb.h)
// =============================================================================

#[repr(C)]
#[derive(Default, Debug)]
struct FbFixScreeninfo {
    id: [u8; 16],
    smem_start: c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

#[repr(C)]
#[derive(Default, Debug)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

#[repr(C)]
#[derive(Default, Debug)]
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

// =============================================================================
// Device
// =============================================================================

/// Memory-mapped Linux framebuffer.
pub struct LinuxFramebuffer {
    _file: File,
    map: *mut u16,
    map_len: usize,
    info: ScreenInfo,
}

impl LinuxFramebuffer {
    pub fn open(path: &Path) -> Result<Self, DeviceError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let fd = file.as_raw_fd();

        let mut fix = FbFixScreeninfo::default();
        // SAFETY: `fix` is a repr(C) mirror of fb_fix_screeninfo and outlives the call
        if unsafe { libc::ioctl(fd, FBIOGET_FSCREENINFO as _, &raw mut fix) } != 0 {
            return Err(DeviceError::FixedInfo(io::Error::last_os_error()));
        }

        let mut var = FbVarScreeninfo::default();
        // SAFETY: `var` is a repr(C) mirror of fb_var_screeninfo and outlives the call
        if unsafe { libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &raw mut var) } != 0 {
            return Err(DeviceError::VariableInfo(io::Error::last_os_error()));
        }

        if var.bits_per_pixel != 16 {
            return Err(DeviceError::UnsupportedDepth(var.bits_per_pixel));
        }
        let invalid = DeviceError::InvalidGeometry {
            width: var.xres,
            height: var.yres,
            line_length: fix.line_length,
        };
        if var.xres == 0 || var.yres == 0 || fix.line_length % 2 != 0 || fix.line_length < var.xres * 2 {
            return Err(invalid);
        }
        let map_len = fix.line_length as usize * var.yres as usize;
        if fix.smem_len != 0 && (fix.smem_len as usize) < map_len {
            return Err(invalid);
        }

        // SAFETY: fresh shared mapping of an open device; checked against MAP_FAILED below
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(DeviceError::Map(io::Error::last_os_error()));
        }

        let info = ScreenInfo {
            width: var.xres,
            height: var.yres,
            bits_per_pixel: var.bits_per_pixel,
            stride: fix.line_length as usize / 2,
        };
        let id_len = fix.id.iter().position(|&b| b == 0).unwrap_or(fix.id.len());
        log::info!(
            "Framebuffer {} ({}): {}x{} @ {} bpp, stride {} px",
            path.display(),
            String::from_utf8_lossy(&fix.id[..id_len]),
            info.width,
            info.height,
            info.bits_per_pixel,
            info.stride
        );

        Ok(Self {
            _file: file,
            map: addr.cast::<u16>(),
            map_len,
            info,
        })
    }
}

impl FrameDevice for LinuxFramebuffer {
    fn info(&self) -> ScreenInfo { self.info }

    fn present(
        &mut self,
        frame: &[u16],
    ) {
        let n = frame.len().min(self.map_len / 2);
        // SAFETY: the mapping holds map_len bytes, n never exceeds map_len / 2 pixels,
        // and a Rust slice cannot alias device memory
        unsafe { ptr::copy_nonoverlapping(frame.as_ptr(), self.map, n) };
    }
}

impl Drop for LinuxFramebuffer {
    fn drop(&mut self) {
        // SAFETY: map/map_len are exactly what mmap returned in open
        if unsafe { libc::munmap(self.map.cast::<c_void>(), self.map_len) } != 0 {
            log::warn!("munmap failed: {}", io::Error::last_os_error());
        }
        log::info!("Framebuffer released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_sizes() {
        // Sizes from linux/fb.h on LP64 targets
        if size_of::<c_ulong>() == 8 {
            assert_eq!(size_of::<FbFixScreeninfo>(), 80);
        }
        assert_eq!(size_of::<FbVarScreeninfo>(), 160);
    }

    #[test]
    fn test_open_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let err = LinuxFramebuffer::open(&dir.path().join("fb0")).err().unwrap();
        assert!(matches!(err, DeviceError::Open { .. }), "got {err:?}");
    }

    #[test]
    fn test_regular_file_is_not_a_framebuffer() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = LinuxFramebuffer::open(file.path()).err().unwrap();
        assert!(matches!(err, DeviceError::FixedInfo(_)), "got {err:?}");
    }
}
