//! Integration tests for the viewer session: wire bytes → decoder →
//! dispatch → pipeline → events, and UI commands → link.

use crate::mock_link::{MockLink, RecordingSink, ScriptedAdc, WireTransport};

use pulselink::app::events::{ConnectionStatus, SessionEvent};
use pulselink::app::node::NodeService;
use pulselink::app::session::SessionCoordinator;
use pulselink::config::LinkConfig;
use pulselink::error::{ConnectionError, Error};
use pulselink::protocol::TransmissionStatus;
use pulselink::signal::BpmEstimate;

fn make_session() -> (SessionCoordinator, RecordingSink) {
    (
        SessionCoordinator::new(&LinkConfig::default()),
        RecordingSink::new(),
    )
}

// ── Module noise ─────────────────────────────────────────────

#[test]
fn at_conn_query_is_a_module_ack_with_no_side_effects() {
    let (mut session, mut sink) = make_session();
    session.on_bytes_received(b"AT+CONN?\r\n", 0, &mut sink);

    assert!(sink.events.is_empty());
    assert_eq!(session.stats().module_acks, 1);
    assert_eq!(session.stats().parse_errors, 0);
    assert!(!session.is_streaming());
    assert!(session.history().is_empty());
}

#[test]
fn noise_interleaved_with_data_is_filtered() {
    let (mut session, mut sink) = make_session();
    session.on_bytes_received(
        b"OK+CONN\r\nADC_DATA:512,2.500,0\r\n+DISC\r\nADC_DATA:x,1\r\n\r\nADC_DATA:520,2.541,100\r\n",
        0,
        &mut sink,
    );
    assert_eq!(sink.samples(), 2);
    let stats = session.stats();
    assert_eq!(stats.module_acks, 2);
    assert_eq!(stats.parse_errors, 1);
    assert_eq!(stats.frames, 2);
}

#[test]
fn overlong_line_is_dropped_and_counted() {
    let (mut session, mut sink) = make_session();
    let mut bytes = vec![b'Z'; 400];
    bytes.extend_from_slice(b"\nPONG\n");
    session.on_bytes_received(&bytes, 0, &mut sink);
    assert_eq!(sink.events, vec![SessionEvent::Pong]);
    assert_eq!(session.stats().overflows, 1);
}

// ── Node → viewer end to end ─────────────────────────────────

#[test]
fn node_stream_produces_bpm_on_viewer() {
    let config = LinkConfig::default();
    let mut node = NodeService::new(config.clone(), 0);
    let mut wire = WireTransport::new();
    // A beat every 8 samples at 10 Hz: 75 bpm.
    let readings: Vec<u16> = (0..80).map(|i| if i % 8 == 0 { 800 } else { 300 }).collect();
    let mut adc = ScriptedAdc::new(&readings);

    let (mut session, mut sink) = make_session();

    wire.inject("START_ADC\n");
    for i in 0..80u64 {
        node.poll(i * 100, &mut wire, &mut adc);
        let bytes = wire.drain_bytes();
        session.on_bytes_received(&bytes, i * 100, &mut sink);
    }

    assert!(session.is_streaming());
    assert_eq!(sink.samples(), 80);
    let last_bpm = sink.events.iter().rev().find_map(|e| match e {
        SessionEvent::Sample { bpm, .. } => Some(*bpm),
        _ => None,
    });
    assert_eq!(last_bpm, Some(Some(BpmEstimate { bpm: 75 })));
    assert_eq!(session.history().len(), 80);
}

#[test]
fn stopped_report_clears_peak_state() {
    let (mut session, mut sink) = make_session();
    session.on_bytes_received(
        b"ADC_TRANSMISSION:STARTED\nADC_DATA:300,1.466,0\nADC_DATA:800,3.910,500\n",
        0,
        &mut sink,
    );
    assert!(session.peak_state().last_voltage > 0.0);

    session.on_bytes_received(b"ADC_TRANSMISSION:STOPPED\n", 0, &mut sink);
    assert!(!session.is_streaming());
    assert_eq!(session.peak_state().last_voltage, 0.0);
    assert_eq!(session.history().len(), 2);
    assert_eq!(
        sink.events.last(),
        Some(&SessionEvent::Transmission(TransmissionStatus::Stopped))
    );
}

// ── Commands ─────────────────────────────────────────────────

#[test]
fn user_commands_reach_the_link() {
    let (mut session, mut sink) = make_session();
    let mut link = MockLink::default();

    for text in ["START_ADC", "STATUS", "hello there"] {
        assert!(session.on_user_command(text, &mut link, &mut sink).is_ok());
    }
    assert_eq!(
        link.sent,
        vec!["START_ADC\r\n", "STATUS\r\n", "hello there\r\n"]
    );
    assert_eq!(link.reconnects, 0);
}

#[test]
fn dropped_link_gets_one_reconnect_then_failure() {
    let (mut session, mut sink) = make_session();
    let mut link = MockLink {
        connected: false,
        reconnect_ok: false,
        ..MockLink::default()
    };

    let result = session.on_user_command("PING", &mut link, &mut sink);
    assert_eq!(result, Err(Error::Connection(ConnectionError::ReconnectFailed)));
    assert_eq!(link.reconnects, 1);
    assert_eq!(
        sink.events,
        vec![
            SessionEvent::Connection(ConnectionStatus::Reconnecting),
            SessionEvent::Connection(ConnectionStatus::Disconnected),
            SessionEvent::CommandFailed {
                command: "PING".into(),
                error: Error::Connection(ConnectionError::ReconnectFailed),
            },
        ]
    );
}

#[test]
fn successful_reconnect_resends_command() {
    let (mut session, mut sink) = make_session();
    let mut link = MockLink {
        connected: false,
        ..MockLink::default()
    };

    assert!(session.on_user_command("STOP_ADC", &mut link, &mut sink).is_ok());
    assert_eq!(link.sent, vec!["STOP_ADC\r\n"]);
    assert_eq!(sink.events.last(), Some(&SessionEvent::CommandSent("STOP_ADC".into())));
}

#[test]
fn disconnect_keeps_history() {
    let (mut session, mut sink) = make_session();
    session.on_bytes_received(b"ADC_DATA:300,1.466,0\nADC_DATA:310,1.515,100\n", 0, &mut sink);
    session.on_disconnect(&mut sink);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.stats().disconnects, 1);

    session.clear_history();
    assert!(session.history().is_empty());
}
