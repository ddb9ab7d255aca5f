use super::codec::CommandFrame;
use super::error::Lw14Error;
use crate::drivers::i2c::channel::BusGuard;
use log::debug;

/// Write a frame to the command register.
///
/// Succeeds only if all three bytes were accepted by the bus.
pub fn execute(bus: &mut BusGuard, device: u8, frame: &CommandFrame) -> Result<(), Lw14Error> {
    debug!("Sending frame {} to 0x{:02x}", frame, device);
    bus.write_register(device, frame.bytes())
        .map_err(Lw14Error::CommandWrite)?;
    Ok(())
}
