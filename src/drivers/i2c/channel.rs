//! Shared handles to numbered I2C buses.
//!
//! Every bus number maps to at most one live [`BusChannel`]. Nodes configured
//! for the same bus get clones of the same `Arc`, and each invocation locks the
//! channel for its whole duration, so transfers from different nodes never
//! interleave on the wire. The registry only keeps weak references; the bus is
//! closed when the last node holding it is closed.

use super::bus::{check_device_address, I2cBus, OpenError, TransferError};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

lazy_static::lazy_static! {
    static ref CHANNELS: Mutex<HashMap<u32, Weak<BusChannel>>> = Mutex::new(HashMap::new());
}

pub struct BusChannel {
    busno: u32,
    bus: Mutex<Box<dyn I2cBus>>,
}

impl BusChannel {
    /// Create a channel that is not visible in the registry
    pub fn new(busno: u32, bus: Box<dyn I2cBus>) -> BusChannel {
        BusChannel {
            busno,
            bus: Mutex::new(bus),
        }
    }

    /// Get the channel for `busno`, opening the bus if nobody holds it.
    pub fn open(busno: u32) -> Result<Arc<BusChannel>, OpenError> {
        let mut channels = CHANNELS.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(channel) = channels.get(&busno).and_then(Weak::upgrade) {
            debug!("Reusing channel for I2C bus {}", busno);
            return Ok(channel);
        }
        let channel = Arc::new(BusChannel::new(busno, open_platform_bus(busno)?));
        channels.insert(busno, Arc::downgrade(&channel));
        info!("Opened I2C bus {}", busno);
        Ok(channel)
    }

    /// Install `bus` as the transport for `busno`.
    ///
    /// Subsequent calls to [`BusChannel::open`] return the new channel for as
    /// long as the returned `Arc`, or a clone of it, is alive.
    pub fn register(busno: u32, bus: Box<dyn I2cBus>) -> Arc<BusChannel> {
        let channel = Arc::new(BusChannel::new(busno, bus));
        let mut channels = CHANNELS.lock().unwrap_or_else(|e| e.into_inner());
        channels.retain(|_, c| c.strong_count() > 0);
        channels.insert(busno, Arc::downgrade(&channel));
        channel
    }

    pub fn busno(&self) -> u32 {
        self.busno
    }

    /// Get exclusive access to the bus
    pub fn lock(&self) -> Result<BusGuard<'_>, TransferError> {
        self.bus
            .lock()
            .map(|bus| BusGuard { bus })
            .map_err(|_| TransferError::Closed)
    }
}

impl Drop for BusChannel {
    fn drop(&mut self) {
        debug!("Closing I2C bus {}", self.busno);
    }
}

#[cfg(target_os = "linux")]
fn open_platform_bus(busno: u32) -> Result<Box<dyn I2cBus>, OpenError> {
    Ok(Box::new(super::linux::LinuxI2cBus::open(busno)?))
}

#[cfg(not(target_os = "linux"))]
fn open_platform_bus(_busno: u32) -> Result<Box<dyn I2cBus>, OpenError> {
    Err(OpenError::Unsupported)
}

/// Exclusive access to a bus for the duration of one invocation
pub struct BusGuard<'a> {
    bus: MutexGuard<'a, Box<dyn I2cBus>>,
}

impl<'a> BusGuard<'a> {
    /// Write `data` starting at the device's current register.
    ///
    /// Fails unless exactly `data.len()` bytes were written.
    pub fn write_register(&mut self, device: u8, data: &[u8]) -> Result<usize, TransferError> {
        let device = check_device_address(device)?;
        let written = self.bus.write(device, data)?;
        if written != data.len() {
            return Err(TransferError::ShortTransfer {
                expected: data.len(),
                actual: written,
            });
        }
        Ok(written)
    }

    /// Read `N` bytes from the device's current register
    pub fn read_register<const N: usize>(&mut self, device: u8) -> Result<[u8; N], TransferError> {
        let device = check_device_address(device)?;
        let mut buf = [0u8; N];
        let read = self.bus.read(device, &mut buf)?;
        if read != N {
            return Err(TransferError::ShortTransfer {
                expected: N,
                actual: read,
            });
        }
        Ok(buf)
    }
}
