//! PulseLink host simulator: node and viewer over an in-memory link.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  node thread                       viewer (main thread)        │
//! │                                                                │
//! │  PulseAdc ─▶ NodeService::poll      edge_executor              │
//! │                 │     ▲               └─ ViewerTask::run       │
//! │                 ▼     │                    ▲        │          │
//! │           LoopbackEnd ◀── loopback ──▶ LoopbackEnd  │          │
//! │                                   │                 ▼          │
//! │                      pump thread ─┴─▶ ChunkChannel  LogEventSink│
//! │                                                                │
//! │  script thread ── CommandChannel ──▶ ViewerTask                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `pulselink-sim [config.json] [run-seconds]`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use pulselink::adapters::log_sink::LogEventSink;
use pulselink::adapters::loopback::{LoopbackEnd, loopback_pair};
use pulselink::adapters::pulse_adc::PulseAdc;
use pulselink::adapters::time::MonotonicClock;
use pulselink::app::commands::ViewerCommand;
use pulselink::app::node::NodeService;
use pulselink::app::ports::{Clock, LinkPort};
use pulselink::config::LinkConfig;
use pulselink::link::{CancelSignal, ChunkChannel, CommandChannel, LinkMsg, ViewerTask};
use pulselink::protocol::transport::Transport;

/// Simulated heart rate.
const SIM_BPM: u16 = 72;
/// Node loop period.
const NODE_POLL: Duration = Duration::from_millis(5);
/// Reader poll period.
const PUMP_POLL: Duration = Duration::from_millis(2);
const DEFAULT_RUN_SECS: u64 = 15;

fn load_config(path: Option<&str>) -> Result<LinkConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {path}"))?;
            let config = LinkConfig::from_json(&text)?;
            info!("Config loaded from {}", path);
            config
        }
        None => {
            info!("Using default config");
            LinkConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

// ── Node side ─────────────────────────────────────────────────

fn run_node(config: LinkConfig, mut transport: LoopbackEnd, clock: MonotonicClock, stop: &AtomicBool) {
    let mut adc = PulseAdc::new(SIM_BPM, config.sample_interval_ms, config.adc_max).with_failures(97);
    let mut node = NodeService::new(config, clock.now_ms());
    node.announce(&mut transport);

    while !stop.load(Ordering::Relaxed) {
        node.poll(clock.now_ms(), &mut transport, &mut adc);
        thread::sleep(NODE_POLL);
    }
    let stats = node.stats();
    info!(
        "Node stopped: {} samples sent, {} send failures, {} heartbeats, {} commands",
        stats.samples_sent, stats.send_failures, stats.heartbeats, stats.commands
    );
}

// ── Transport reader ──────────────────────────────────────────

fn run_pump(mut reader: LoopbackEnd, chunks: &ChunkChannel, stop: &AtomicBool) {
    let mut buf = [0u8; 128];
    let mut connected = true;
    while !stop.load(Ordering::Relaxed) {
        match reader.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                chunks.push_bytes(&buf[..n]);
            }
            Err(_) if connected => {
                connected = false;
                chunks.push(LinkMsg::Disconnected);
            }
            Err(_) => {}
        }
        if !connected && reader.is_connected() {
            connected = true;
        }
        thread::sleep(PUMP_POLL);
    }
}

// ── Scripted user ─────────────────────────────────────────────

fn run_script(
    commands: &CommandChannel,
    link: &LoopbackEnd,
    cancel: &CancelSignal,
    run_secs: u64,
) {
    let at = |secs: f32| thread::sleep(Duration::from_secs_f32(secs));
    let send = |text: &str| {
        info!("USER | {}", text);
        commands.send(ViewerCommand::Send(text.to_string()));
    };

    send("HELLO");
    at(0.5);
    send("START_ADC");
    at(2.5);
    send("PING");
    send("BLINK");
    at(3.0);
    warn!("Simulating a radio dropout");
    link.disconnect();
    at(2.0);
    send("STATUS");
    send("START_ADC");

    let elapsed = 8;
    if run_secs > elapsed + 1 {
        thread::sleep(Duration::from_secs(run_secs - elapsed - 1));
    }
    send("STOP_ADC");
    at(1.0);
    cancel.signal(());
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  PulseLink simulator v{}          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let run_secs = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("invalid run time {s:?}"))?,
        None => DEFAULT_RUN_SECS,
    };

    let clock = MonotonicClock::new();
    let (node_end, viewer_end) = loopback_pair();
    let chunks: Arc<ChunkChannel> = Arc::new(ChunkChannel::new());
    let commands = Arc::new(CommandChannel::new());
    let cancel = Arc::new(CancelSignal::new());
    let stop = Arc::new(AtomicBool::new(false));

    let node = {
        let (config, stop) = (config.clone(), stop.clone());
        thread::Builder::new()
            .name("node".into())
            .spawn(move || run_node(config, node_end, clock, &stop))?
    };
    let pump = {
        let (reader, chunks, stop) = (viewer_end.clone(), chunks.clone(), stop.clone());
        thread::Builder::new()
            .name("pump".into())
            .spawn(move || run_pump(reader, &chunks, &stop))?
    };
    let script = {
        let (link, commands, cancel) = (viewer_end.clone(), commands.clone(), cancel.clone());
        thread::Builder::new()
            .name("script".into())
            .spawn(move || run_script(&commands, &link, &cancel, run_secs))?
    };

    chunks.push(LinkMsg::Connected);

    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    let mut viewer = ViewerTask::new(&config, viewer_end, LogEventSink::new(), clock);
    let task = executor.spawn(async move {
        viewer.run(&*chunks, &*commands, &*cancel).await
    });
    let stats = futures_lite::future::block_on(executor.run(task));

    stop.store(true, Ordering::Relaxed);
    for (name, handle) in [("node", node), ("pump", pump), ("script", script)] {
        handle
            .join()
            .map_err(|_| anyhow!("{name} thread panicked"))?;
    }

    info!(
        "Viewer stopped: {} frames, {} samples, {} parse errors, {} module acks, {} dropped chunks, {} disconnects",
        stats.frames,
        stats.samples,
        stats.parse_errors,
        stats.module_acks,
        stats.dropped_chunks,
        stats.disconnects
    );
    Ok(())
}
