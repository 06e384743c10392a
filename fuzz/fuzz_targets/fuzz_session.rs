//! Fuzz target: `SessionCoordinator::on_bytes_received`
//!
//! Arbitrary inbound bytes must never panic the viewer session, and any
//! heart-rate estimate it reports must be plausible.
//!
//! cargo fuzz run fuzz_session

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulselink::app::events::SessionEvent;
use pulselink::app::ports::EventSink;
use pulselink::app::session::SessionCoordinator;
use pulselink::config::LinkConfig;
use pulselink::signal::peak::{MAX_BPM, MIN_BPM};

struct CheckingSink;

impl EventSink for CheckingSink {
    fn emit(&mut self, event: &SessionEvent) {
        if let SessionEvent::Sample { bpm: Some(b), .. } = event {
            assert!((MIN_BPM..=MAX_BPM).contains(&b.bpm));
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut session = SessionCoordinator::new(&LinkConfig::default());
    let mut sink = CheckingSink;
    for (i, chunk) in data.chunks(17).enumerate() {
        session.on_bytes_received(chunk, i as u64 * 100, &mut sink);
    }
    session.on_disconnect(&mut sink);
    assert!(!session.is_streaming());
});
