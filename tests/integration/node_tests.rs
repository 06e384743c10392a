//! Integration tests for the node loop: commands → state machine →
//! scheduler → wire.

use crate::mock_link::{ScriptedAdc, WireTransport};

use pulselink::app::node::NodeService;
use pulselink::config::LinkConfig;
use pulselink::protocol::{Frame, TransmissionStatus, decode};

fn make_node() -> NodeService {
    NodeService::new(LinkConfig::default(), 0)
}

fn count_adc(lines: &[String]) -> usize {
    lines.iter().filter(|l| l.starts_with("ADC_DATA:")).count()
}

// ── START → 3 samples → STOP ──────────────────────────────────

#[test]
fn start_three_ticks_stop_yields_three_samples_then_stopped() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[300, 500, 700, 900, 900]);

    wire.inject("START_ADC\r\n");
    node.poll(0, &mut wire, &mut adc);
    node.poll(100, &mut wire, &mut adc);
    node.poll(200, &mut wire, &mut adc);
    wire.inject("STOP_ADC\r\n");
    node.poll(300, &mut wire, &mut adc);

    let lines = wire.drain_lines();
    assert_eq!(lines[0], "ADC_TRANSMISSION:STARTED");
    let raws: Vec<u16> = lines
        .iter()
        .filter_map(|l| match decode(l) {
            Ok(Some(Frame::AdcData(d))) => Some(d.raw),
            _ => None,
        })
        .collect();
    assert_eq!(raws, vec![300, 500, 700]);
    assert_eq!(lines.last().map(String::as_str), Some("ADC_TRANSMISSION:STOPPED"));

    // Nothing but heartbeats afterwards.
    for now in (400..4000).step_by(100) {
        node.poll(now, &mut wire, &mut adc);
    }
    assert_eq!(count_adc(&wire.drain_lines()), 0);
}

#[test]
fn samples_carry_timestamps() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[512, 512]);

    wire.inject("START_ADC\n");
    node.poll(1000, &mut wire, &mut adc);
    node.poll(1100, &mut wire, &mut adc);

    let stamps: Vec<Option<u64>> = wire
        .drain_lines()
        .iter()
        .filter_map(|l| match decode(l) {
            Ok(Some(Frame::AdcData(d))) => Some(d.timestamp_ms),
            _ => None,
        })
        .collect();
    assert_eq!(stamps, vec![Some(1000), Some(1100)]);
}

// ── Error threshold ──────────────────────────────────────────

#[test]
fn ten_failed_sends_force_idle_and_report_error_once() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[512; 32]);

    wire.inject("START_ADC\n");
    node.poll(0, &mut wire, &mut adc);
    wire.drain_lines();

    // Ten sample sends fail; the ERROR notice itself goes through.
    wire.fail_writes = 10;
    for i in 1..=10u64 {
        node.poll(i * 100, &mut wire, &mut adc);
    }
    assert!(!node.is_sampling());

    let lines = wire.drain_lines();
    let errors = lines
        .iter()
        .filter(|l| decode(l) == Ok(Some(Frame::Transmission(TransmissionStatus::Error))))
        .count();
    assert_eq!(errors, 1);

    for i in 11..=30u64 {
        node.poll(i * 100, &mut wire, &mut adc);
    }
    assert_eq!(count_adc(&wire.drain_lines()), 0);
}

#[test]
fn restart_after_error_clears_counter() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[512; 32]);

    wire.inject("START_ADC\n");
    node.poll(0, &mut wire, &mut adc);
    wire.fail_writes = 10;
    for i in 1..=10u64 {
        node.poll(i * 100, &mut wire, &mut adc);
    }
    wire.drain_lines();

    wire.inject("START_ADC\n");
    node.poll(1100, &mut wire, &mut adc);
    assert!(node.is_sampling());
    assert_eq!(node.context().transmission.error_count(), 0);
    let lines = wire.drain_lines();
    assert_eq!(lines[0], "ADC_TRANSMISSION:STARTED");
    assert_eq!(count_adc(&lines), 1);
}

// ── Heartbeat and status ─────────────────────────────────────

#[test]
fn heartbeat_continues_while_sampling() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[512; 200]);

    wire.inject("START_ADC\n");
    for now in (0..=5000).step_by(100) {
        node.poll(now, &mut wire, &mut adc);
    }
    let lines = wire.drain_lines();
    assert!(lines.contains(&"HEARTBEAT:5s".to_string()));
    assert_eq!(count_adc(&lines), 51);
}

#[test]
fn boot_banner_and_hello() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[]);

    node.announce(&mut wire);
    wire.inject("HELLO\n");
    node.poll(0, &mut wire, &mut adc);
    assert_eq!(
        wire.drain_lines(),
        vec!["SYSTEM_STATUS:READY,DISABLED", "SYSTEM_STATUS:READY,DISABLED"]
    );
}

#[test]
fn commands_split_across_reads_are_reassembled() {
    let mut node = make_node();
    let mut wire = WireTransport::new();
    let mut adc = ScriptedAdc::new(&[]);

    wire.inject("PI");
    node.poll(0, &mut wire, &mut adc);
    assert!(wire.drain_lines().is_empty());
    wire.inject("NG\r\n");
    node.poll(10, &mut wire, &mut adc);
    assert_eq!(wire.drain_lines(), vec!["PONG"]);
}
