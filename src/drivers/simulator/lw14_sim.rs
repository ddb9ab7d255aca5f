//! Register level model of an LW14 bridge with DALI gears attached.
//!
//! The simulator implements [`I2cBus`] and can be shared: clones refer to the
//! same bridge, so a test can hand one clone to a [`BusChannel`] and keep
//! another to script failures and inspect what was written.
//!
//! [`BusChannel`]: crate::drivers::i2c::channel::BusChannel

use crate::drivers::i2c::bus::{I2cBus, TransferError};
use crate::drivers::lw14::defs::{state, CMD_SIZE, REG_CMD, REG_STATUS, STATUS_SIZE};
use crate::gear::cmd_defs as cmd;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

const MAX_LEVEL: u8 = 254;
const MIN_LEVEL: u8 = 1;
const MASK: u8 = 0xff;

#[derive(Debug, Clone)]
struct SimGear {
    level: u8,
    groups: u16,
    scenes: [u8; 16],
    answers: HashMap<u8, u8>,
}

impl SimGear {
    fn new() -> SimGear {
        SimGear {
            level: 0,
            groups: 0,
            scenes: [MASK; 16],
            answers: HashMap::new(),
        }
    }

    fn command(&mut self, opcode: u8) {
        match opcode {
            cmd::OFF => self.level = 0,
            cmd::RECALL_MAX_LEVEL => self.level = MAX_LEVEL,
            cmd::RECALL_MIN_LEVEL => self.level = MIN_LEVEL,
            0x10..=0x1f => {
                let level = self.scenes[usize::from(opcode & 0x0f)];
                if level != MASK {
                    self.level = level;
                }
            }
            _ => {}
        }
    }

    fn answer(&self, opcode: u8) -> Option<u8> {
        if let Some(a) = self.answers.get(&opcode) {
            return Some(*a);
        }
        match opcode {
            cmd::QUERY_CONTROL_GEAR_PRESENT => Some(0xff),
            cmd::QUERY_ACTUAL_LEVEL => Some(self.level),
            cmd::QUERY_STATUS => Some(if self.level > 0 {
                crate::base::status::flag::LAMP_ON
            } else {
                0
            }),
            cmd::QUERY_GROUPS_0_7 => Some(self.groups as u8),
            cmd::QUERY_GROUPS_8_15 => Some((self.groups >> 8) as u8),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    device: u8,
    pointer: u8,
    gears: HashMap<u8, SimGear>,
    // Answer waiting to be fetched from the command register
    answer: Option<u8>,
    answer_delay: u32,
    pending_polls: u32,
    busy_polls: u32,
    bus_fault: bool,
    fault_after_submit: bool,
    failing_reads: u32,
    failing_reads_after_submit: u32,
    // Scripted read outcomes, true fails the read
    read_script: VecDeque<bool>,
    read_script_after_submit: Vec<bool>,
    write_overrides: VecDeque<Option<usize>>,
    writes: Vec<Vec<u8>>,
    status_reads: u32,
}

impl SimState {
    fn status(&mut self) -> u8 {
        self.status_reads += 1;
        if self.bus_fault {
            state::BUS_FAULT
        } else if self.busy_polls > 0 {
            self.busy_polls -= 1;
            state::BUSY
        } else if self.answer.is_some() {
            if self.pending_polls > 0 {
                self.pending_polls -= 1;
                state::BUSY
            } else {
                state::VALID | state::ONE_BYTE
            }
        } else {
            state::NONE
        }
    }

    fn frame(&mut self, addr: u8, data: u8) {
        let selected: Vec<u8> = self
            .gears
            .iter()
            .filter(|(short, gear)| match addr >> 1 {
                0x7f => true,
                a @ 0..=0x3f => **short == a,
                a @ 0x40..=0x4f => gear.groups & (1 << (a & 0x0f)) != 0,
                _ => false,
            })
            .map(|(short, _)| *short)
            .collect();
        debug!("Sim frame {:02x} {:02x} to gears {:?}", addr, data, selected);
        self.answer = None;
        if self.fault_after_submit {
            self.bus_fault = true;
        }
        self.failing_reads += std::mem::take(&mut self.failing_reads_after_submit);
        let script = std::mem::take(&mut self.read_script_after_submit);
        self.read_script.extend(script);
        for short in &selected {
            let Some(gear) = self.gears.get_mut(short) else {
                continue;
            };
            if addr & 0x01 == 0 {
                if data != MASK {
                    gear.level = data;
                }
            } else if data >= cmd::QUERY_STATUS {
                // Only answer queries to a single gear
                if addr & 0x80 == 0 {
                    self.answer = gear.answer(data);
                    self.pending_polls = self.answer_delay;
                }
            } else {
                gear.command(data);
            }
        }
    }
}

#[derive(Clone)]
pub struct Lw14Sim {
    state: Arc<Mutex<SimState>>,
}

impl Lw14Sim {
    /// Create a bridge answering at 7-bit address `device`
    pub fn new(device: u8) -> Lw14Sim {
        Lw14Sim {
            state: Arc::new(Mutex::new(SimState {
                device,
                pointer: REG_STATUS,
                ..SimState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_gear(&self, short: u8) {
        self.state().gears.insert(short, SimGear::new());
    }

    pub fn add_to_group(&self, short: u8, group: u8) {
        if let Some(gear) = self.state().gears.get_mut(&short) {
            gear.groups |= 1 << (group & 0x0f);
        }
    }

    pub fn set_scene(&self, short: u8, scene: u8, level: u8) {
        if let Some(gear) = self.state().gears.get_mut(&short) {
            gear.scenes[usize::from(scene & 0x0f)] = level;
        }
    }

    /// Fixed answer for a query to one gear
    pub fn set_answer(&self, short: u8, query: u8, value: u8) {
        if let Some(gear) = self.state().gears.get_mut(&short) {
            gear.answers.insert(query, value);
        }
    }

    pub fn gear_level(&self, short: u8) -> Option<u8> {
        self.state().gears.get(&short).map(|g| g.level)
    }

    /// Report BUSY for the next `polls` status reads
    pub fn set_busy_polls(&self, polls: u32) {
        self.state().busy_polls = polls;
    }

    /// Status reads after a query before the answer becomes valid
    pub fn set_answer_delay(&self, polls: u32) {
        self.state().answer_delay = polls;
    }

    pub fn set_bus_fault(&self, fault: bool) {
        self.state().bus_fault = fault;
    }

    /// Raise BUS_FAULT once the next frame has been written
    pub fn set_fault_after_submit(&self, fault: bool) {
        self.state().fault_after_submit = fault;
    }

    /// Fail the next `count` reads
    pub fn fail_reads(&self, count: u32) {
        self.state().failing_reads = count;
    }

    /// Fail `count` reads following the next frame
    pub fn fail_reads_after_submit(&self, count: u32) {
        self.state().failing_reads_after_submit = count;
    }

    /// Outcomes of the next reads in order, `true` fails the read.
    ///
    /// Reads not failed by the script are handled normally.
    pub fn script_reads(&self, fail: &[bool]) {
        self.state().read_script = fail.iter().copied().collect();
    }

    /// Like [`Lw14Sim::script_reads`], starting after the next frame
    pub fn script_reads_after_submit(&self, fail: &[bool]) {
        self.state().read_script_after_submit = fail.to_vec();
    }

    /// Byte counts reported for the following writes.
    ///
    /// `Some(n)` reports `n` bytes written without acting on the data, `None`
    /// handles the write normally.
    pub fn override_writes(&self, counts: &[Option<usize>]) {
        self.state().write_overrides = counts.iter().copied().collect();
    }

    /// Everything written to the bridge so far
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }

    pub fn status_reads(&self) -> u32 {
        self.state().status_reads
    }
}

fn no_ack(device: u8) -> TransferError {
    TransferError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("No acknowledge from 0x{:02x}", device),
    ))
}

impl I2cBus for Lw14Sim {
    fn write(&mut self, device: u8, data: &[u8]) -> Result<usize, TransferError> {
        let mut state = self.state();
        if device != state.device {
            return Err(no_ack(device));
        }
        state.writes.push(data.to_vec());
        if let Some(Some(count)) = state.write_overrides.pop_front() {
            return Ok(count);
        }
        match data {
            [] => {}
            [reg] => state.pointer = *reg,
            [REG_CMD, addr, value, ..] => {
                state.frame(*addr, *value);
                state.pointer = REG_STATUS;
            }
            [reg, ..] => state.pointer = *reg,
        }
        Ok(data.len())
    }

    fn read(&mut self, device: u8, buf: &mut [u8]) -> Result<usize, TransferError> {
        let mut state = self.state();
        if device != state.device {
            return Err(no_ack(device));
        }
        let scripted_failure = state.read_script.pop_front().unwrap_or(false);
        if scripted_failure || state.failing_reads > 0 {
            if !scripted_failure {
                state.failing_reads -= 1;
            }
            return Err(TransferError::Io(io::Error::new(
                io::ErrorKind::Other,
                "Simulated read failure",
            )));
        }
        let mut reg = [0u8; CMD_SIZE];
        let len = if state.pointer == REG_CMD {
            reg[0] = state.answer.take().unwrap_or(0);
            CMD_SIZE
        } else {
            reg[0] = state.status();
            STATUS_SIZE
        };
        state.pointer = REG_STATUS;
        let n = len.min(buf.len());
        buf[..n].copy_from_slice(&reg[..n]);
        Ok(n)
    }
}
