pub mod error;

pub mod base {
    pub mod address;
    pub mod status;
}

pub mod gear {
    pub mod cmd_defs;
}

pub mod drivers;

pub mod utils {
    pub mod dyn_future;
}
