//! Opcodes of addressed DALI gear commands.
//!
//! Only the second (opcode) byte is defined here. The address byte is built by
//! the LW14 codec from the configured addressing mode.

macro_rules! opcode_defs {
    ($table: ident { $($sym: ident = $opcode: expr),* $(,)? }) => {
        $(pub const $sym: u8 = $opcode;)*

        pub const $table: &[(&str, u8)] = &[$((stringify!($sym), $opcode)),*];
    };
}

opcode_defs!(COMMANDS {
    OFF = 0x00,
    UP = 0x01,
    DOWN = 0x02,
    STEP_UP = 0x03,
    STEP_DOWN = 0x04,
    RECALL_MAX_LEVEL = 0x05,
    RECALL_MIN_LEVEL = 0x06,
    STEP_DOWN_AND_OFF = 0x07,
    ON_AND_STEP_UP = 0x08,
    ENABLE_DAPC = 0x09,
    GO_TO_LAST_ACTIVE_LEVEL = 0x0a,
    IDENTIFY_DEVICE = 0x25,
});

opcode_defs!(QUERIES {
    QUERY_STATUS = 0x90,
    QUERY_CONTROL_GEAR_PRESENT = 0x91,
    QUERY_LAMP_FAILURE = 0x92,
    QUERY_LAMP_POWER_ON = 0x93,
    QUERY_LIMIT_ERROR = 0x94,
    QUERY_RESET_STATE = 0x95,
    QUERY_MISSING_SHORT_ADDRESS = 0x96,
    QUERY_VERSION_NUMBER = 0x97,
    QUERY_CONTENT_DTR0 = 0x98,
    QUERY_DEVICE_TYPE = 0x99,
    QUERY_PHYSICAL_MINIMUM = 0x9a,
    QUERY_POWER_FAILURE = 0x9b,
    QUERY_ACTUAL_LEVEL = 0xa0,
    QUERY_MAX_LEVEL = 0xa1,
    QUERY_MIN_LEVEL = 0xa2,
    QUERY_POWER_ON_LEVEL = 0xa3,
    QUERY_SYSTEM_FAILURE_LEVEL = 0xa4,
    QUERY_FADE = 0xa5,
    QUERY_GROUPS_0_7 = 0xc0,
    QUERY_GROUPS_8_15 = 0xc1,
});

pub const SCENE_COUNT: u8 = 16;

/// Opcode for GO TO SCENE
#[allow(non_snake_case)]
#[inline(always)]
pub const fn GO_TO_SCENE(scene: u8) -> u8 {
    0x10 + (scene & 0x0f)
}

/// Look up an opcode by its symbolic name, case insensitive.
pub fn from_name(name: &str) -> Option<u8> {
    let name = name.trim().to_ascii_uppercase();
    COMMANDS
        .iter()
        .chain(QUERIES.iter())
        .find(|(sym, _)| *sym == name)
        .map(|(_, opcode)| *opcode)
}

/// Look up the symbolic name of a query opcode
pub fn query_name(opcode: u8) -> Option<&'static str> {
    QUERIES
        .iter()
        .find(|(_, code)| *code == opcode)
        .map(|(sym, _)| *sym)
}

#[test]
fn lookup_names() {
    assert_eq!(from_name("off"), Some(OFF));
    assert_eq!(from_name("QUERY_STATUS"), Some(0x90));
    assert_eq!(from_name(" query_actual_level "), Some(0xa0));
    assert_eq!(from_name("NO_SUCH_COMMAND"), None);
    assert_eq!(query_name(144), Some("QUERY_STATUS"));
    assert_eq!(query_name(OFF), None);
    assert_eq!(GO_TO_SCENE(0), 0x10);
    assert_eq!(GO_TO_SCENE(15), 0x1f);
}
