use std::fmt;

/// Bits of the answer to QUERY STATUS
pub mod flag {
    pub const GEAR_FAILURE: u8 = 0x01;
    pub const LAMP_FAILURE: u8 = 0x02;
    pub const LAMP_ON: u8 = 0x04;
    pub const LIMIT_ERROR: u8 = 0x08;
    pub const FADE_RUNNING: u8 = 0x10;
    pub const RESET_STATE: u8 = 0x20;
    pub const NO_ADDRESS: u8 = 0x40;
    pub const POWER_CYCLE: u8 = 0x80;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GearStatus(u8);

impl GearStatus {
    pub fn new(status: u8) -> GearStatus {
        GearStatus(status)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn lamp_on(&self) -> bool {
        self.0 & flag::LAMP_ON != 0
    }
}

impl fmt::Display for GearStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 8] = [
            (flag::GEAR_FAILURE, "gear failure"),
            (flag::LAMP_FAILURE, "lamp failure"),
            (flag::LAMP_ON, "lamp on"),
            (flag::LIMIT_ERROR, "limit error"),
            (flag::FADE_RUNNING, "fade running"),
            (flag::RESET_STATE, "reset state"),
            (flag::NO_ADDRESS, "no address"),
            (flag::POWER_CYCLE, "power cycle"),
        ];
        let strs: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.0 & bit != 0)
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&strs.join(", "))
    }
}

#[test]
fn gear_status_display() {
    assert_eq!(GearStatus::new(0x00).to_string(), "");
    assert_eq!(GearStatus::new(0x04).to_string(), "lamp on");
    assert_eq!(
        GearStatus::new(0x83).to_string(),
        "gear failure, lamp failure, power cycle"
    );
    assert!(GearStatus::new(0x04).lamp_on());
}
