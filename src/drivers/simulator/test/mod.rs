use crate as lw14;
use lw14::base::address::AddressingMode;
use lw14::drivers::i2c::channel::BusChannel;
use lw14::drivers::lw14::async_node::AsyncLw14Node;
use lw14::drivers::lw14::config::{NodeConfig, Operation};
use lw14::drivers::lw14::error::Lw14Error;
use lw14::drivers::lw14::node::Lw14Node;
use lw14::drivers::lw14::query::{PollOptions, QueryResult, QueryState};
use lw14::drivers::simulator::lw14_sim::Lw14Sim;
use lw14::gear::cmd_defs as cmd;
use std::sync::Arc;
use std::time::Duration;

const DEVICE: u8 = 0x23;

fn config(json: &str) -> NodeConfig {
    NodeConfig::from_json(json).unwrap()
}

fn sim_channel(busno: u32) -> (Lw14Sim, Arc<BusChannel>) {
    let sim = Lw14Sim::new(DEVICE);
    let channel = Arc::new(BusChannel::new(busno, Box::new(sim.clone())));
    (sim, channel)
}

#[test]
fn dacp_group() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(1);
    sim.add_gear(2);
    sim.add_to_group(2, 5);
    let mut node = Lw14Node::with_channel(
        Operation::Dacp,
        &config(r#"{"address":"23","dali_type":"1","dali_adr":"5","dali_value":"80"}"#),
        channel,
    )
    .unwrap();
    assert_eq!(node.trigger().unwrap(), None);
    assert_eq!(sim.writes(), vec![vec![0x01, 0x8a, 0x50]]);
    assert_eq!(sim.gear_level(2), Some(80));
    assert_eq!(sim.gear_level(1), Some(0));
}

#[test]
fn broadcast_mask() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(0);
    let mut node = Lw14Node::with_channel(
        Operation::Dacp,
        &config(r#"{"dali_type":"0","dali_value":"255"}"#),
        channel,
    )
    .unwrap();
    node.send_command().unwrap();
    assert_eq!(sim.writes(), vec![vec![0x01, 0xfe, 0xff]]);
    // Mask level leaves the gear untouched
    assert_eq!(sim.gear_level(0), Some(0));
}

#[test]
fn command_and_scene() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(63);
    sim.set_scene(63, 2, 42);
    let mut max = Lw14Node::with_channel(
        Operation::Command,
        &config(r#"{"dali_type":"2","dali_adr":"63","dali_value":"5"}"#),
        channel.clone(),
    )
    .unwrap();
    let mut scene = Lw14Node::with_channel(
        Operation::Scene,
        &config(r#"{"dali_type":"2","dali_adr":"63","dali_value":"18"}"#),
        channel,
    )
    .unwrap();
    max.trigger().unwrap();
    assert_eq!(sim.gear_level(63), Some(254));
    scene.trigger().unwrap();
    assert_eq!(sim.gear_level(63), Some(42));
    assert_eq!(
        sim.writes(),
        vec![
            vec![0x01, 0x7f, cmd::RECALL_MAX_LEVEL],
            vec![0x01, 0x7f, cmd::GO_TO_SCENE(2)]
        ]
    );
}

#[test]
fn command_failure_is_per_invocation() {
    let (sim, channel) = sim_channel(1);
    sim.override_writes(&[Some(2)]);
    let mut node = Lw14Node::with_channel(
        Operation::Command,
        &config(r#"{"dali_type":"0","dali_value":"0"}"#),
        channel,
    )
    .unwrap();
    assert!(matches!(node.trigger(), Err(Lw14Error::CommandWrite(_))));
    assert!(node.is_open());
    assert_eq!(node.trigger().unwrap(), None);
}

#[test]
fn query_result() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(3);
    sim.set_answer(3, cmd::QUERY_STATUS, 77);
    // Addressing mode is ignored by queries
    let mut node = Lw14Node::with_channel(
        Operation::Query,
        &config(r#"{"dali_type":"0","dali_adr":"3","dali_value":"144"}"#),
        channel,
    )
    .unwrap();
    assert_eq!(node.settings().mode, AddressingMode::Short);
    let res = node.trigger().unwrap().unwrap();
    assert_eq!(
        res,
        QueryResult {
            address: 3,
            query: 144,
            value: 77
        }
    );
    assert_eq!(node.query_state(), QueryState::Done);
    assert_eq!(
        serde_json::to_string(&res).unwrap(),
        r#"{"address":3,"query":144,"value":77}"#
    );
}

#[test]
fn query_actual_level_after_dacp() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(9);
    let mut dacp = Lw14Node::with_channel(
        Operation::Dacp,
        &config(r#"{"dali_type":2,"dali_adr":9,"dali_value":123}"#),
        channel.clone(),
    )
    .unwrap();
    let mut query = Lw14Node::with_channel(
        Operation::Query,
        &config(r#"{"dali_adr":9,"dali_value":160}"#),
        channel,
    )
    .unwrap();
    sim.set_answer_delay(3);
    dacp.trigger().unwrap();
    assert_eq!(query.trigger().unwrap().map(|r| r.value), Some(123));
}

#[test]
fn query_fault_gives_no_result() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(3);
    sim.set_bus_fault(true);
    let mut node = Lw14Node::with_channel(
        Operation::Query,
        &config(r#"{"dali_adr":"3","dali_value":"144"}"#),
        channel,
    )
    .unwrap();
    assert!(matches!(node.trigger(), Err(Lw14Error::BusFault(_))));
    assert_eq!(node.query_state(), QueryState::Aborted);
    // Recovers when the fault is gone
    sim.set_bus_fault(false);
    sim.set_answer(3, cmd::QUERY_STATUS, 1);
    assert_eq!(node.trigger().unwrap().map(|r| r.value), Some(1));
}

#[test]
fn query_timeout_option() {
    let (_sim, channel) = sim_channel(1);
    let mut node = Lw14Node::with_channel(
        Operation::Query,
        &config(r#"{"dali_adr":"30","dali_value":"144"}"#),
        channel,
    )
    .unwrap();
    node.set_poll_options(PollOptions {
        interval: Duration::from_millis(2),
        timeout: Some(Duration::from_millis(30)),
        ..PollOptions::default()
    });
    assert!(matches!(node.trigger(), Err(Lw14Error::PollTimeout(_))));
}

#[test]
fn wrong_operation() {
    let (_sim, channel) = sim_channel(1);
    let mut node = Lw14Node::with_channel(
        Operation::Dacp,
        &config(r#"{"dali_type":"0","dali_value":"0"}"#),
        channel,
    )
    .unwrap();
    assert!(matches!(
        node.send_query(),
        Err(Lw14Error::WrongOperation(Operation::Dacp))
    ));
}

#[test]
fn close_is_idempotent() {
    let (sim, channel) = sim_channel(1);
    let mut node = Lw14Node::with_channel(
        Operation::Command,
        &config(r#"{"dali_type":"0","dali_value":"0"}"#),
        channel.clone(),
    )
    .unwrap();
    assert_eq!(Arc::strong_count(&channel), 2);
    node.close();
    node.close();
    assert!(!node.is_open());
    assert_eq!(Arc::strong_count(&channel), 1);
    assert!(matches!(node.trigger(), Err(Lw14Error::Closed)));
    assert!(sim.writes().is_empty());
}

#[test]
fn invalid_config_rejected() {
    let (_sim, channel) = sim_channel(1);
    let res = Lw14Node::with_channel(
        Operation::Dacp,
        &config(r#"{"dali_type":"1","dali_adr":"70","dali_value":"0"}"#),
        channel,
    );
    assert!(matches!(res, Err(Lw14Error::Config(_))));
}

#[test]
fn nodes_share_registered_bus() {
    let sim = Lw14Sim::new(DEVICE);
    sim.add_gear(4);
    let _bus = BusChannel::register(9101, Box::new(sim.clone()));
    let mut dacp = Lw14Node::open(
        Operation::Dacp,
        &config(r#"{"busno":"9101","dali_type":"2","dali_adr":"4","dali_value":"33"}"#),
    )
    .unwrap();
    let mut query = Lw14Node::open(
        Operation::Query,
        &config(r#"{"busno":9101,"dali_adr":"4","dali_value":"160"}"#),
    )
    .unwrap();
    dacp.trigger().unwrap();
    assert_eq!(query.trigger().unwrap().map(|r| r.value), Some(33));
}

#[test]
fn concurrent_nodes_serialised() {
    let (sim, channel) = sim_channel(1);
    for short in 0..4 {
        sim.add_gear(short);
    }
    sim.set_answer_delay(50);
    let handles: Vec<_> = (0..4u8)
        .map(|short| {
            let channel = channel.clone();
            std::thread::spawn(move || {
                let json = format!(r#"{{"dali_adr":{},"dali_value":145}}"#, short);
                let mut node = Lw14Node::with_channel(
                    Operation::Query,
                    &NodeConfig::from_json(&json).unwrap(),
                    channel,
                )
                .unwrap();
                (0..5)
                    .map(|_| node.trigger().unwrap().map(|r| r.value))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for h in handles {
        // Every query gets QUERY CONTROL GEAR PRESENT answered
        assert_eq!(h.join().unwrap(), vec![Some(0xff); 5]);
    }
}

#[tokio::test]
async fn async_trigger() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(3);
    sim.set_answer(3, cmd::QUERY_STATUS, 4);
    let node = AsyncLw14Node::new(
        Lw14Node::with_channel(
            Operation::Query,
            &config(r#"{"dali_adr":"3","dali_value":"144"}"#),
            channel,
        )
        .unwrap(),
    );
    let res = node.trigger().await.unwrap();
    assert_eq!(res.map(|r| r.value), Some(4));
    node.close().await;
    assert!(matches!(node.trigger().await, Err(Lw14Error::Closed)));
}

#[tokio::test]
async fn async_triggers_run_one_at_a_time() {
    let (sim, channel) = sim_channel(1);
    sim.add_gear(2);
    sim.set_answer_delay(20);
    let node = AsyncLw14Node::new(
        Lw14Node::with_channel(
            Operation::Query,
            &config(r#"{"dali_adr":"2","dali_value":"160"}"#),
            channel,
        )
        .unwrap(),
    );
    let other = node.clone();
    let (a, b) = futures::future::join(node.trigger(), other.trigger()).await;
    assert_eq!(a.unwrap().map(|r| r.value), Some(0));
    assert_eq!(b.unwrap().map(|r| r.value), Some(0));
    // Each query wrote its frame and fetched its own answer
    assert_eq!(
        sim.writes(),
        vec![vec![0x01, 0x05, 0xa0], vec![0x01], vec![0x01, 0x05, 0xa0], vec![0x01]]
    );
}
