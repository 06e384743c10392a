//! Integration tests for the viewer task over the in-memory loopback link.

use futures_lite::future;

use crate::mock_link::{RecordingSink, ScriptedAdc};

use pulselink::adapters::loopback::{LoopbackEnd, loopback_pair};
use pulselink::app::commands::ViewerCommand;
use pulselink::app::events::{ConnectionStatus, SessionEvent};
use pulselink::app::node::NodeService;
use pulselink::app::ports::{Clock, LinkPort};
use pulselink::config::LinkConfig;
use pulselink::link::{CancelSignal, ChunkChannel, CommandChannel, LinkMsg, ViewerTask};
use pulselink::protocol::transport::Transport;

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

fn config() -> LinkConfig {
    LinkConfig {
        reconnect_delay_ms: 0,
        ..LinkConfig::default()
    }
}

/// Move everything the viewer end can read into the chunk channel.
fn pump<const N: usize>(reader: &mut LoopbackEnd, chunks: &ChunkChannel<N>) {
    let mut buf = [0u8; 64];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                chunks.push_bytes(&buf[..n]);
            }
            Err(_) => {
                chunks.push(LinkMsg::Disconnected);
                break;
            }
        }
    }
}

#[test]
fn viewer_commands_drive_node_over_loopback() {
    let cfg = config();
    let (mut node_end, viewer_end) = loopback_pair();
    let mut reader = viewer_end.clone();
    let mut node = NodeService::new(cfg.clone(), 0);
    let mut adc = ScriptedAdc::new(&[300, 500, 700]);

    let chunks: ChunkChannel<64> = ChunkChannel::new();
    let commands = CommandChannel::new();
    let cancel = CancelSignal::new();
    let mut viewer = ViewerTask::new(&cfg, viewer_end, RecordingSink::new(), FixedClock(0));

    // Viewer sends START_ADC.
    commands.send(ViewerCommand::Send("START_ADC".into()));
    cancel.signal(());
    future::block_on(viewer.run(&chunks, &commands, &cancel));

    // Node picks it up and streams three samples.
    for now in [0, 100, 200] {
        node.poll(now, &mut node_end, &mut adc);
    }
    pump(&mut reader, &chunks);

    cancel.signal(());
    let stats = future::block_on(viewer.run(&chunks, &commands, &cancel));

    assert_eq!(stats.samples, 3);
    assert!(viewer.session().is_streaming());
    assert_eq!(viewer.sink().samples(), 3);
    assert_eq!(
        viewer.sink().events.first(),
        Some(&SessionEvent::CommandSent("START_ADC".into()))
    );
}

#[test]
fn dropout_resets_session_and_reconnects_once() {
    let cfg = config();
    let (mut node_end, viewer_end) = loopback_pair();
    let mut reader = viewer_end.clone();
    let mut node = NodeService::new(cfg.clone(), 0);
    let mut adc = ScriptedAdc::new(&[512; 8]);

    let chunks: ChunkChannel<64> = ChunkChannel::new();
    let commands = CommandChannel::new();
    let cancel = CancelSignal::new();
    let mut viewer = ViewerTask::new(&cfg, viewer_end, RecordingSink::new(), FixedClock(0));

    // Start the node from the viewer end.
    reader.write(b"START_ADC\r\n").ok();
    node.poll(0, &mut node_end, &mut adc);
    pump(&mut reader, &chunks);

    reader.disconnect();
    pump(&mut reader, &chunks);

    cancel.signal(());
    let stats = future::block_on(viewer.run(&chunks, &commands, &cancel));

    assert_eq!(stats.disconnects, 1);
    assert!(!viewer.session().is_streaming());
    // The loopback always accepts a reconnect.
    assert!(viewer.link().is_connected());
    let tail: Vec<&SessionEvent> = viewer.sink().events.iter().rev().take(2).collect();
    assert_eq!(
        tail,
        vec![
            &SessionEvent::Connection(ConnectionStatus::Connected),
            &SessionEvent::Connection(ConnectionStatus::Reconnecting),
        ]
    );
}

#[test]
fn burst_beyond_channel_capacity_drops_oldest() {
    let cfg = config();
    let chunks: ChunkChannel<4> = ChunkChannel::new();
    let commands = CommandChannel::new();
    let cancel = CancelSignal::new();
    let (_, viewer_end) = loopback_pair();
    let mut viewer = ViewerTask::new(&cfg, viewer_end, RecordingSink::new(), FixedClock(42));

    for i in 0..10u16 {
        chunks.push_bytes(format!("ADC_DATA:{},1.000\n", 300 + i).as_bytes());
    }
    assert_eq!(chunks.dropped(), 6);

    cancel.signal(());
    let stats = future::block_on(viewer.run(&chunks, &commands, &cancel));
    // The first survivor may start mid-line after a gap, so it is skipped.
    assert_eq!(stats.samples, 3);
    assert_eq!(stats.dropped_chunks, 6);
}

#[test]
fn evicted_chunk_does_not_splice_lines() {
    let cfg = config();
    let chunks: ChunkChannel<1> = ChunkChannel::new();
    let commands = CommandChannel::new();
    let cancel = CancelSignal::new();
    let (_, viewer_end) = loopback_pair();
    let mut viewer = ViewerTask::new(&cfg, viewer_end, RecordingSink::new(), FixedClock(0));

    chunks.push_bytes(b"ADC_DATA:1");
    cancel.signal(());
    future::block_on(viewer.run(&chunks, &commands, &cancel));

    chunks.push_bytes(b"23,0.601,5\nADC_DATA:9");
    chunks.push_bytes(b"00,4.399,7\nPONG\n");
    assert_eq!(chunks.dropped(), 1);

    cancel.signal(());
    let stats = future::block_on(viewer.run(&chunks, &commands, &cancel));

    assert_eq!(stats.samples, 0);
    assert_eq!(viewer.sink().samples(), 0);
    assert_eq!(stats.dropped_chunks, 1);
    assert_eq!(viewer.sink().events.last(), Some(&SessionEvent::Pong));
}

#[test]
fn disconnect_notice_survives_a_full_channel() {
    let cfg = config();
    let chunks: ChunkChannel<2> = ChunkChannel::new();
    let commands = CommandChannel::new();
    let cancel = CancelSignal::new();
    let (_, viewer_end) = loopback_pair();
    let mut viewer = ViewerTask::new(&cfg, viewer_end, RecordingSink::new(), FixedClock(0));

    chunks.push_bytes(b"ADC_TRANSMISSION:STARTED\n");
    cancel.signal(());
    future::block_on(viewer.run(&chunks, &commands, &cancel));
    assert!(viewer.session().is_streaming());

    chunks.push(LinkMsg::Disconnected);
    chunks.push_bytes(b"HEARTBEAT:1s\n");
    chunks.push_bytes(b"HEARTBEAT:2s\n");

    cancel.signal(());
    let stats = future::block_on(viewer.run(&chunks, &commands, &cancel));

    assert_eq!(stats.disconnects, 1);
    assert!(!viewer.session().is_streaming());
    let events = &viewer.sink().events;
    let disconnected = events
        .iter()
        .position(|e| *e == SessionEvent::Connection(ConnectionStatus::Disconnected));
    let first_heartbeat = events
        .iter()
        .position(|e| matches!(e, SessionEvent::Heartbeat(_)));
    assert!(disconnected.is_some());
    assert!(disconnected < first_heartbeat);
    assert!(events.contains(&SessionEvent::Heartbeat("2s".into())));
}
