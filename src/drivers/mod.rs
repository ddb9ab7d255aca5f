pub mod i2c {
    pub mod bus;
    pub mod channel;
    #[cfg(target_os = "linux")]
    pub mod linux;
}

pub mod lw14 {
    pub mod async_node;
    pub mod codec;
    pub mod command;
    pub mod config;
    pub mod defs;
    pub mod error;
    pub mod node;
    pub mod query;
    pub mod status;
}

#[cfg(any(test, feature = "simulator"))]
pub mod simulator {
    pub mod lw14_sim;
    #[cfg(test)]
    mod test;
}
