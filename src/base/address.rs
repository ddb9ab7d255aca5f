use core::ops::RangeInclusive;
use core::str::FromStr;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AddressError {
    InvalidAddress,
    InvalidMode,
}

impl fmt::Display for AddressError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddressError::InvalidAddress => write!(fmt, "Invalid address"),
            AddressError::InvalidMode => write!(fmt, "Invalid addressing mode"),
        }
    }
}

impl std::error::Error for AddressError {}

/// Which devices a frame is directed to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressingMode {
    Broadcast,
    Group,
    Short,
}

impl AddressingMode {
    /// Value used by the node configuration: 0 = broadcast, 1 = group, 2 = short
    pub fn config_value(&self) -> u8 {
        match self {
            AddressingMode::Broadcast => 0,
            AddressingMode::Group => 1,
            AddressingMode::Short => 2,
        }
    }
}

impl TryFrom<u8> for AddressingMode {
    type Error = AddressError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(AddressingMode::Broadcast),
            1 => Ok(AddressingMode::Group),
            2 => Ok(AddressingMode::Short),
            _ => Err(AddressError::InvalidMode),
        }
    }
}

impl FromStr for AddressingMode {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broadcast" | "b" => Ok(AddressingMode::Broadcast),
            "group" | "g" => Ok(AddressingMode::Group),
            "short" | "single" | "s" => Ok(AddressingMode::Short),
            other => u8::from_str(other)
                .map_err(|_| AddressError::InvalidMode)
                .and_then(AddressingMode::try_from),
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::Broadcast => write!(f, "broadcast"),
            AddressingMode::Group => write!(f, "group"),
            AddressingMode::Short => write!(f, "short"),
        }
    }
}

/// Selects bit 0 of the address byte.
///
/// Scenes and queries are sent with the command bit set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Dacp,
    Command,
}

impl OperationKind {
    pub const fn selector_bit(&self) -> u8 {
        match self {
            OperationKind::Dacp => 0x00,
            OperationKind::Command => 0x01,
        }
    }
}

/// Device or group number as written in the address byte
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(u8);

impl Target {
    pub const RANGE: RangeInclusive<u8> = 0..=63;

    pub fn new<A>(a: A) -> Result<Target, AddressError>
    where
        A: TryInto<u8>,
    {
        let Ok(a) = a.try_into() else {
            return Err(AddressError::InvalidAddress);
        };
        if !Self::RANGE.contains(&a) {
            return Err(AddressError::InvalidAddress);
        }
        Ok(Target(a))
    }

    /// Address 0..64
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(fmt)
    }
}

impl FromStr for Target {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u8::from_str(s.trim()).map_or(Err(AddressError::InvalidAddress), Target::new)
    }
}
