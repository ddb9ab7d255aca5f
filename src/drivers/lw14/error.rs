use super::config::{ConfigError, Operation};
use super::query::PollStage;
use super::status::StatusByte;
use crate::drivers::i2c::bus::{OpenError, TransferError};
use std::error::Error;
use std::fmt;

/// Failure of a single node operation.
///
/// Only `Config` and `Connect` are reported when a node is set up. Everything
/// else concerns one invocation and leaves the channel usable.
#[derive(Debug)]
pub enum Lw14Error {
    Config(ConfigError),
    Connect(OpenError),
    CommandWrite(TransferError),
    BusFault(StatusByte),
    StatusReadExhausted { failures: u32 },
    AnswerWaitExhausted { failures: u32 },
    PollTimeout(PollStage),
    QuerySubmit(TransferError),
    AnswerFetch(TransferError),
    WrongOperation(Operation),
    Closed,
    Task(String),
}

impl Error for Lw14Error {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Lw14Error::Config(err) => Some(err),
            Lw14Error::Connect(err) => Some(err),
            Lw14Error::CommandWrite(err)
            | Lw14Error::QuerySubmit(err)
            | Lw14Error::AnswerFetch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for Lw14Error {
    fn from(err: ConfigError) -> Lw14Error {
        Lw14Error::Config(err)
    }
}

impl From<OpenError> for Lw14Error {
    fn from(err: OpenError) -> Lw14Error {
        Lw14Error::Connect(err)
    }
}

impl fmt::Display for Lw14Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lw14Error::Config(err) => write!(f, "Invalid configuration: {}", err),
            Lw14Error::Connect(err) => write!(f, "Failed to open I2C bus: {}", err),
            Lw14Error::CommandWrite(err) => write!(f, "Command write failed: {}", err),
            Lw14Error::BusFault(status) => write!(f, "DALI bus fault, status: {}", status),
            Lw14Error::StatusReadExhausted { failures } => write!(
                f,
                "Too many errors ({}) reading status register while waiting for bus ready",
                failures
            ),
            Lw14Error::AnswerWaitExhausted { failures } => write!(
                f,
                "Too many errors ({}) reading status register while waiting for answer",
                failures
            ),
            Lw14Error::PollTimeout(stage) => write!(f, "Timeout while waiting for {}", stage),
            Lw14Error::QuerySubmit(err) => write!(f, "Query write failed: {}", err),
            Lw14Error::AnswerFetch(err) => write!(f, "Reading answer failed: {}", err),
            Lw14Error::WrongOperation(op) => write!(f, "Not supported by {} node", op),
            Lw14Error::Closed => write!(f, "Node closed"),
            Lw14Error::Task(err) => write!(f, "Invocation aborted: {}", err),
        }
    }
}
