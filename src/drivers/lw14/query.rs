//! Polling protocol for DALI queries through the LW14.
//!
//! A query runs through these states:
//!
//! 1. `AwaitBusIdle`: poll the status register until neither BUSY nor
//!    BUS_FAULT is set.
//! 2. `SubmitQuery`: write the query frame.
//! 3. `AwaitAnswer`: poll the status register until VALID and ONE_BYTE are
//!    set. The gear should answer within 100 ms.
//! 4. `FetchAnswer`: point the device at the command register and read the
//!    answer back.
//!
//! BUS_FAULT while polling aborts at once. Failed status reads are counted and
//! the query is aborted when more than [`PollOptions::max_failures`]
//! consecutive reads fail. With the default options there is no delay between
//! polls and no time limit.

use super::codec::CommandFrame;
use super::defs::{CMD_SIZE, REG_CMD, STATUS_SIZE};
use super::error::Lw14Error;
use super::status::StatusByte;
use crate::drivers::i2c::channel::BusGuard;
use log::{debug, trace, warn};
use serde_derive::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_FAILURES: u32 = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Sleep between status polls
    pub interval: Duration,
    /// Give up waiting after this long
    pub timeout: Option<Duration>,
    /// Abort after more than this many consecutive failed status reads
    pub max_failures: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            interval: Duration::ZERO,
            timeout: None,
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueryState {
    AwaitBusIdle,
    SubmitQuery,
    AwaitAnswer,
    FetchAnswer,
    Done,
    Aborted,
}

/// The status poll loops of a query
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PollStage {
    BusIdle,
    Answer,
}

impl PollStage {
    fn exhausted(&self, failures: u32) -> Lw14Error {
        match self {
            PollStage::BusIdle => Lw14Error::StatusReadExhausted { failures },
            PollStage::Answer => Lw14Error::AnswerWaitExhausted { failures },
        }
    }
}

impl fmt::Display for PollStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollStage::BusIdle => write!(f, "bus ready"),
            PollStage::Answer => write!(f, "answer"),
        }
    }
}

/// Answer to a query. Serializes to the payload sent by query nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub address: u8,
    pub query: u8,
    pub value: u8,
}

pub struct QueryExecutor {
    options: PollOptions,
    state: QueryState,
}

impl QueryExecutor {
    pub fn new(options: PollOptions) -> QueryExecutor {
        QueryExecutor {
            options,
            state: QueryState::Done,
        }
    }

    /// State reached by the last query
    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Send query `code` to short address `target` and wait for the answer
    pub fn execute(
        &mut self,
        bus: &mut BusGuard,
        device: u8,
        target: u8,
        code: u8,
    ) -> Result<QueryResult, Lw14Error> {
        let res = self.run(bus, device, target, code);
        if let Err(e) = &res {
            warn!(
                "Query 0x{:02x} to {} aborted in state {:?}: {}",
                code, target, self.state, e
            );
            self.state = QueryState::Aborted;
        }
        res
    }

    fn run(
        &mut self,
        bus: &mut BusGuard,
        device: u8,
        target: u8,
        code: u8,
    ) -> Result<QueryResult, Lw14Error> {
        self.state = QueryState::AwaitBusIdle;
        self.poll_status(bus, device, PollStage::BusIdle, StatusByte::idle)?;

        self.state = QueryState::SubmitQuery;
        let frame = CommandFrame::query(target, code);
        debug!("Sending query {} to 0x{:02x}", frame, device);
        bus.write_register(device, frame.bytes())
            .map_err(Lw14Error::QuerySubmit)?;

        self.state = QueryState::AwaitAnswer;
        self.poll_status(bus, device, PollStage::Answer, StatusByte::answer_ready)?;

        self.state = QueryState::FetchAnswer;
        bus.write_register(device, &[REG_CMD])
            .map_err(Lw14Error::AnswerFetch)?;
        let answer = bus
            .read_register::<CMD_SIZE>(device)
            .map_err(Lw14Error::AnswerFetch)?;

        self.state = QueryState::Done;
        debug!("Query 0x{:02x} to {} answered {}", code, target, answer[0]);
        Ok(QueryResult {
            address: target,
            query: code,
            value: answer[0],
        })
    }

    fn poll_status<F>(
        &self,
        bus: &mut BusGuard,
        device: u8,
        stage: PollStage,
        ready: F,
    ) -> Result<StatusByte, Lw14Error>
    where
        F: Fn(&StatusByte) -> bool,
    {
        let start = Instant::now();
        let mut failures = 0;
        loop {
            match bus.read_register::<STATUS_SIZE>(device) {
                Ok(status) => {
                    failures = 0;
                    let status = StatusByte::new(status[0]);
                    if status.bus_fault() {
                        return Err(Lw14Error::BusFault(status));
                    }
                    if ready(&status) {
                        return Ok(status);
                    }
                    trace!("Waiting for {}, status: {}", stage, status);
                }
                Err(e) => {
                    failures += 1;
                    debug!("Status read failed ({}): {}", failures, e);
                    if failures > self.options.max_failures {
                        return Err(stage.exhausted(failures));
                    }
                }
            }
            if let Some(timeout) = self.options.timeout {
                if start.elapsed() >= timeout {
                    return Err(Lw14Error::PollTimeout(stage));
                }
            }
            if !self.options.interval.is_zero() {
                std::thread::sleep(self.options.interval);
            }
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        QueryExecutor::new(PollOptions::default())
    }
}
