//! Fuzz target for event envelopes.
//!
//! Arbitrary previews must be truncated on a character boundary and the
//! envelope must always serialize to JSON that parses back.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vibe_realtime::{EventEnvelope, PREVIEW_MAX_CHARS};

fuzz_target!(|data: &[u8]| {
    let preview = String::from_utf8_lossy(data);
    let envelope = EventEnvelope::new_message("chat", "message", preview.as_ref());

    assert!(envelope.preview().chars().count() <= PREVIEW_MAX_CHARS);

    let payload = envelope.to_payload().expect("envelope serializes");
    let parsed: EventEnvelope = serde_json::from_str(&payload).expect("payload parses");
    assert_eq!(parsed.preview(), envelope.preview());

    // Incoming JSON must never panic the decoder
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<EventEnvelope>(s);
    }
});
