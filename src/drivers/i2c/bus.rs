use std::error::Error;
use std::fmt;

/// Highest valid 7-bit device address
pub const MAX_DEVICE_ADDRESS: u8 = 0x7f;

#[derive(Debug)]
pub enum TransferError {
    Io(std::io::Error),
    Nix(nix::Error),
    ShortTransfer { expected: usize, actual: usize },
    InvalidAddress(u8),
    Closed,
}

impl Error for TransferError {}

impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> TransferError {
        TransferError::Io(err)
    }
}

impl From<nix::Error> for TransferError {
    fn from(err: nix::Error) -> TransferError {
        TransferError::Nix(err)
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Io(err) => write!(f, "{}", err),
            TransferError::Nix(err) => write!(f, "{}", err),
            TransferError::ShortTransfer { expected, actual } => {
                write!(f, "Transferred {} bytes, expected {}", actual, expected)
            }
            TransferError::InvalidAddress(a) => write!(f, "Invalid device address 0x{:02x}", a),
            TransferError::Closed => write!(f, "Bus channel closed"),
        }
    }
}

#[derive(Debug)]
pub enum OpenError {
    NotFound(String),
    Io(std::io::Error),
    Unsupported,
}

impl Error for OpenError {}

impl From<std::io::Error> for OpenError {
    fn from(err: std::io::Error) -> OpenError {
        OpenError::Io(err)
    }
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::NotFound(path) => write!(f, "No I2C bus at {}", path),
            OpenError::Io(err) => write!(f, "{}", err),
            OpenError::Unsupported => write!(f, "I2C buses not supported on this platform"),
        }
    }
}

/// Raw access to an I2C bus.
///
/// Both operations return the number of bytes actually transferred. Checking
/// the count against the requested length is left to the caller.
pub trait I2cBus: Send {
    /// Write `data` to the device at 7-bit address `device`
    fn write(&mut self, device: u8, data: &[u8]) -> Result<usize, TransferError>;

    /// Read up to `buf.len()` bytes from the device at 7-bit address `device`
    fn read(&mut self, device: u8, buf: &mut [u8]) -> Result<usize, TransferError>;
}

pub fn check_device_address(device: u8) -> Result<u8, TransferError> {
    if device > MAX_DEVICE_ADDRESS {
        Err(TransferError::InvalidAddress(device))
    } else {
        Ok(device)
    }
}
