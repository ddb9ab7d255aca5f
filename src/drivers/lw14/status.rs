use super::defs::state;
use std::fmt;

/// First byte of the LW14 status register
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusByte(u8);

impl StatusByte {
    pub fn new(status: u8) -> StatusByte {
        StatusByte(status)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn bus_fault(&self) -> bool {
        self.0 & state::BUS_FAULT != 0
    }

    pub fn busy(&self) -> bool {
        self.0 & state::BUSY != 0
    }

    /// The bus can accept a new frame
    pub fn idle(&self) -> bool {
        !self.busy() && !self.bus_fault()
    }

    /// A valid single byte answer is waiting in the command register
    pub fn answer_ready(&self) -> bool {
        const READY: u8 = state::VALID | state::ONE_BYTE;
        self.0 & READY == READY
    }
}

impl fmt::Display for StatusByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 8] = [
            (state::ONE_BYTE, "one byte"),
            (state::TWO_BYTE, "two bytes"),
            (state::TIMEFRAME, "timeframe"),
            (state::VALID, "valid"),
            (state::FRAME_ERROR, "frame error"),
            (state::OVERRUN, "overrun"),
            (state::BUSY, "busy"),
            (state::BUS_FAULT, "bus fault"),
        ];
        if self.0 == state::NONE {
            return f.write_str("none");
        }
        let strs: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.0 & bit != 0)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{} (0x{:02x})", strs.join(", "), self.0)
    }
}
