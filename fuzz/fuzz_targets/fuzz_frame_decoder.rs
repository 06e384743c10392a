//! Fuzz target: `FrameDecoder::feed`
//!
//! Drives arbitrary byte sequences through the line decoder, split at a
//! fuzzer-chosen point, and checks that splitting never changes the
//! decoded output and the line buffer stays bounded.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulselink::protocol::FrameDecoder;

fuzz_target!(|data: &[u8]| {
    let Some((&cut, bytes)) = data.split_first() else {
        return;
    };

    let mut whole = Vec::new();
    let mut decoder = FrameDecoder::new();
    decoder.feed(bytes, |item| whole.push(item));
    assert!(decoder.pending_len() <= 256, "line buffer exceeded");

    let mut split = Vec::new();
    let mut decoder = FrameDecoder::new();
    let (head, tail) = bytes.split_at(usize::from(cut).min(bytes.len()));
    decoder.feed(head, |item| split.push(item));
    decoder.feed(tail, |item| split.push(item));
    assert_eq!(whole, split, "chunk boundary changed the output");

    decoder.reset();
    assert_eq!(decoder.pending_len(), 0);
});
