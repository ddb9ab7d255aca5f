/// Factory default I2C address (7-bit)
pub const DEFAULT_I2C_ADDRESS: u8 = 0x23;

pub const REG_STATUS: u8 = 0x00;
pub const REG_CMD: u8 = 0x01;

pub const STATUS_SIZE: usize = 2;
pub const CMD_SIZE: usize = 3;

pub const DALI_MODE_DACP: u8 = 0x00;
pub const DALI_MODE_CMD: u8 = 0x01;
pub const DALI_ADR_GROUP: u8 = 0x80;
pub const DALI_ADR_SHORT: u8 = 0x00;
pub const DALI_ADR_BROADCAST: u8 = 0xfe;

/// Bits of the first byte in the status register
pub mod state {
    pub const NONE: u8 = 0x00;
    pub const ONE_BYTE: u8 = 0x01;
    pub const TWO_BYTE: u8 = 0x02;
    pub const TIMEFRAME: u8 = 0x04;
    pub const VALID: u8 = 0x08;
    pub const FRAME_ERROR: u8 = 0x10;
    pub const OVERRUN: u8 = 0x20;
    pub const BUSY: u8 = 0x40;
    pub const BUS_FAULT: u8 = 0x80;
}
