//! Translation of DALI addressing into LW14 command register writes.

use super::defs::{DALI_ADR_BROADCAST, DALI_ADR_GROUP, DALI_ADR_SHORT, REG_CMD};
use crate::base::address::{AddressingMode, OperationKind};
use std::fmt;

const TARGET_MASK: u8 = 0x3f;

/// Build the DALI address byte.
///
/// `target` is masked to six bits; ranges are checked when the node is
/// configured.
pub fn address_byte(kind: OperationKind, mode: AddressingMode, target: u8) -> u8 {
    let selector = kind.selector_bit();
    let target = ((target & TARGET_MASK) << 1) & 0xfe;
    match mode {
        AddressingMode::Broadcast => DALI_ADR_GROUP | DALI_ADR_BROADCAST | selector,
        AddressingMode::Group => DALI_ADR_GROUP | target | selector,
        AddressingMode::Short => DALI_ADR_SHORT | target | selector,
    }
}

/// A complete write to the LW14 command register
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandFrame([u8; 3]);

impl CommandFrame {
    pub fn new(kind: OperationKind, mode: AddressingMode, target: u8, data: u8) -> CommandFrame {
        CommandFrame([REG_CMD, address_byte(kind, mode, target), data])
    }

    /// Queries are only defined for single devices
    pub fn query(target: u8, code: u8) -> CommandFrame {
        Self::new(OperationKind::Command, AddressingMode::Short, target, code)
    }

    pub fn bytes(&self) -> &[u8; 3] {
        &self.0
    }

    pub fn address_byte(&self) -> u8 {
        self.0[1]
    }

    pub fn data_byte(&self) -> u8 {
        self.0[2]
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x} {:02x} {:02x}", self.0[0], self.0[1], self.0[2])
    }
}
