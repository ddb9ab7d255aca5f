use clap::{value_parser, Arg, Command};
use log::{error, info};
use lw14::base::address::AddressingMode;
use lw14::base::status::GearStatus;
use lw14::drivers::lw14::async_node::AsyncLw14Node;
use lw14::drivers::lw14::config::{ConfigValue, NodeConfig, Operation};
use lw14::drivers::lw14::node::Lw14Node;
use lw14::drivers::lw14::query::PollOptions;
use lw14::error::DynResult;
use lw14::gear::cmd_defs as cmd;
use lw14_dali as lw14;
use std::time::Duration;

fn parse_number(s: &str) -> Option<u8> {
    match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Data byte for the operation. Scenes are given by number, other
/// operations by value or opcode name.
fn parse_value(op: Operation, s: &str) -> DynResult<u8> {
    if op == Operation::Scene {
        return match parse_number(s) {
            Some(scene) if scene < cmd::SCENE_COUNT => Ok(cmd::GO_TO_SCENE(scene)),
            _ => Err(format!("Scene must be 0-{}", cmd::SCENE_COUNT - 1).into()),
        };
    }
    parse_number(s)
        .or_else(|| cmd::from_name(s))
        .ok_or_else(|| format!("Invalid value or unknown command: {}", s).into())
}

fn config_from_file(path: &str) -> DynResult<NodeConfig> {
    let json = std::fs::read_to_string(path)?;
    Ok(NodeConfig::from_json(&json)?)
}

#[cfg(feature = "simulator")]
fn start_simulator(
    config: &NodeConfig,
) -> DynResult<std::sync::Arc<lw14::drivers::i2c::channel::BusChannel>> {
    use lw14::drivers::i2c::channel::BusChannel;
    use lw14::drivers::simulator::lw14_sim::Lw14Sim;
    let sim = Lw14Sim::new(config.device()?);
    for short in 0..4 {
        sim.add_gear(short);
    }
    info!("Simulating LW14 on bus {}", config.busno());
    Ok(BusChannel::register(config.busno(), Box::new(sim)))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let command = Command::new("lw14_send")
        .about("Send DALI commands and queries through an LW14 I2C bridge.")
        .arg(
            Arg::new("OPERATION")
                .required(true)
                .value_parser(["dacp", "cmd", "scene", "query"])
                .help("Type of operation"),
        )
        .arg(
            Arg::new("VALUE")
                .required_unless_present("config")
                .help("Level, opcode or command name. Scene number for scenes."),
        )
        .arg(
            Arg::new("bus")
                .short('b')
                .long("bus")
                .default_value("1")
                .help("I2C bus number"),
        )
        .arg(
            Arg::new("address")
                .short('a')
                .long("address")
                .default_value("23")
                .help("I2C address of LW14 (hex)"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .default_value("broadcast")
                .value_parser(value_parser!(AddressingMode))
                .help("Addressing: broadcast, group or short"),
        )
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .default_value("0")
                .value_parser(value_parser!(u8).range(0..=63))
                .help("Device or group number"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Milliseconds between status polls"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(value_parser!(u64))
                .help(
                    "Give up waiting for the bridge after this many milliseconds. \
                     Without it a query to gear that never answers waits forever.",
                ),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Read node configuration from JSON file"),
        );
    #[cfg(feature = "simulator")]
    let command = command.arg(
        Arg::new("simulate")
            .long("simulate")
            .action(clap::ArgAction::SetTrue)
            .help("Use a simulated bridge with gears 0-3"),
    );
    let matches = command.get_matches();

    let op: Operation = match matches.get_one::<String>("OPERATION").unwrap().parse() {
        Ok(op) => op,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    let config = match matches.get_one::<String>("config") {
        Some(path) => match config_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read configuration from {}: {}", path, e);
                return;
            }
        },
        None => {
            let value = match parse_value(op, matches.get_one::<String>("VALUE").unwrap()) {
                Ok(v) => v,
                Err(e) => {
                    error!("{}", e);
                    return;
                }
            };
            let mode = matches.get_one::<AddressingMode>("mode").unwrap();
            let target = *matches.get_one::<u8>("target").unwrap();
            NodeConfig {
                name: Some("lw14_send".to_string()),
                busno: Some(matches.get_one::<String>("bus").unwrap().as_str().into()),
                address: Some(matches.get_one::<String>("address").unwrap().as_str().into()),
                dali_type: Some(ConfigValue::from(i64::from(mode.config_value()))),
                dali_adr: Some(ConfigValue::from(i64::from(target))),
                dali_value: Some(ConfigValue::from(i64::from(value))),
            }
        }
    };

    #[cfg(feature = "simulator")]
    let _sim = if matches.get_flag("simulate") {
        match start_simulator(&config) {
            Ok(channel) => Some(channel),
            Err(e) => {
                error!("Failed to start simulator: {}", e);
                return;
            }
        }
    } else {
        None
    };

    let mut node = match Lw14Node::open(op, &config) {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to set up {} node: {}", op, e);
            return;
        }
    };
    node.set_poll_options(PollOptions {
        interval: Duration::from_millis(*matches.get_one::<u64>("interval").unwrap()),
        timeout: matches
            .get_one::<u64>("timeout")
            .map(|&t| Duration::from_millis(t)),
        ..PollOptions::default()
    });
    let node = AsyncLw14Node::new(node);
    match node.trigger().await {
        Ok(Some(res)) => {
            match serde_json::to_string(&res) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to encode result: {}", e),
            }
            if res.query == cmd::QUERY_STATUS {
                println!("Status: {}", GearStatus::new(res.value));
            } else if let Some(name) = cmd::query_name(res.query) {
                println!("{}: {}", name, res.value);
            }
        }
        Ok(None) => info!("Sent"),
        Err(_) => std::process::exit(1),
    }
}
