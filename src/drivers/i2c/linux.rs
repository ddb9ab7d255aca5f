use super::bus::{check_device_address, I2cBus, OpenError, TransferError};
use log::debug;
use nix::errno::Errno;
use nix::libc;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::io::AsRawFd;

// From linux/i2c-dev.h
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// I2C bus accessed through the i2c-dev character device
pub struct LinuxI2cBus {
    file: File,
    // Device address last selected with I2C_SLAVE
    selected: Option<u8>,
}

impl LinuxI2cBus {
    pub fn open(busno: u32) -> Result<LinuxI2cBus, OpenError> {
        let path = format!("/dev/i2c-{}", busno);
        let file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(OpenError::NotFound(path)),
            Err(e) => return Err(OpenError::Io(e)),
        };
        debug!("Opened {}", path);
        Ok(LinuxI2cBus {
            file,
            selected: None,
        })
    }

    fn select(&mut self, device: u8) -> Result<(), TransferError> {
        let device = check_device_address(device)?;
        if self.selected != Some(device) {
            let res = unsafe {
                libc::ioctl(
                    self.file.as_raw_fd(),
                    I2C_SLAVE as _,
                    libc::c_ulong::from(device),
                )
            };
            Errno::result(res).map_err(nix::Error::from)?;
            self.selected = Some(device);
        }
        Ok(())
    }
}

impl I2cBus for LinuxI2cBus {
    fn write(&mut self, device: u8, data: &[u8]) -> Result<usize, TransferError> {
        self.select(device)?;
        Ok(self.file.write(data)?)
    }

    fn read(&mut self, device: u8, buf: &mut [u8]) -> Result<usize, TransferError> {
        self.select(device)?;
        Ok(self.file.read(buf)?)
    }
}
