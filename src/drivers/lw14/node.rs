use super::codec::CommandFrame;
use super::command;
use super::config::{NodeConfig, Operation, Settings};
use super::error::Lw14Error;
use super::query::{PollOptions, QueryExecutor, QueryResult, QueryState};
use crate::drivers::i2c::channel::BusChannel;
use log::{debug, error, info};
use std::sync::Arc;

/// One configured LW14 operation.
///
/// The bus channel is acquired when the node is opened and released by
/// [`Lw14Node::close`] or when the node is dropped. Each trigger locks the
/// channel until the invocation is complete.
pub struct Lw14Node {
    op: Operation,
    name: Option<String>,
    settings: Settings,
    channel: Option<Arc<BusChannel>>,
    query: QueryExecutor,
}

impl Lw14Node {
    /// Validate `config` and open the configured bus
    pub fn open(op: Operation, config: &NodeConfig) -> Result<Lw14Node, Lw14Error> {
        let settings = config.settings(op)?;
        let channel = BusChannel::open(settings.busno)?;
        Ok(Self::build(op, config, settings, channel))
    }

    /// Validate `config` and use `channel` regardless of the configured bus
    pub fn with_channel(
        op: Operation,
        config: &NodeConfig,
        channel: Arc<BusChannel>,
    ) -> Result<Lw14Node, Lw14Error> {
        let settings = config.settings(op)?;
        Ok(Self::build(op, config, settings, channel))
    }

    fn build(
        op: Operation,
        config: &NodeConfig,
        settings: Settings,
        channel: Arc<BusChannel>,
    ) -> Lw14Node {
        info!(
            "{} node {} on bus {}, device 0x{:02x}",
            op,
            config.name.as_deref().unwrap_or("-"),
            channel.busno(),
            settings.device
        );
        Lw14Node {
            op,
            name: config.name.clone(),
            settings,
            channel: Some(channel),
            query: QueryExecutor::default(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_poll_options(&mut self, options: PollOptions) {
        self.query = QueryExecutor::new(options);
    }

    /// State reached by the last query
    pub fn query_state(&self) -> QueryState {
        self.query.state()
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Frame written by DACP, command and scene nodes
    pub fn frame(&self) -> CommandFrame {
        CommandFrame::new(
            self.op.kind(),
            self.settings.mode,
            self.settings.target.value(),
            self.settings.value,
        )
    }

    fn channel(&self) -> Result<&BusChannel, Lw14Error> {
        self.channel.as_deref().ok_or(Lw14Error::Closed)
    }

    /// Send the configured DACP level, command or scene
    pub fn send_command(&mut self) -> Result<(), Lw14Error> {
        if self.op == Operation::Query {
            return Err(Lw14Error::WrongOperation(self.op));
        }
        let frame = self.frame();
        let channel = self.channel()?;
        let mut bus = channel.lock().map_err(|_| Lw14Error::Closed)?;
        command::execute(&mut bus, self.settings.device, &frame)
    }

    /// Send the configured query and wait for the answer
    pub fn send_query(&mut self) -> Result<QueryResult, Lw14Error> {
        if self.op != Operation::Query {
            return Err(Lw14Error::WrongOperation(self.op));
        }
        // Borrow only the channel field, self.query is borrowed mutably below
        let channel = self.channel.as_deref().ok_or(Lw14Error::Closed)?;
        // A poisoned lock means an earlier invocation panicked mid-transfer
        let mut bus = channel.lock().map_err(|_| Lw14Error::Closed)?;
        self.query.execute(
            &mut bus,
            self.settings.device,
            self.settings.target.value(),
            self.settings.value,
        )
    }

    /// Handle an input event.
    ///
    /// Returns the result to send on for query nodes. Errors are logged and
    /// returned; the node stays usable.
    pub fn trigger(&mut self) -> Result<Option<QueryResult>, Lw14Error> {
        let res = match self.op {
            Operation::Query => self.send_query().map(Some),
            _ => self.send_command().map(|_| None),
        };
        if let Err(e) = &res {
            error!(
                "Error: {} {}: {}",
                self.op,
                self.name.as_deref().unwrap_or(""),
                e
            );
        }
        res
    }

    /// Release the bus channel. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            debug!("Closing {} node on bus {}", self.op, channel.busno());
        }
    }
}

impl Drop for Lw14Node {
    fn drop(&mut self) {
        self.close();
    }
}
