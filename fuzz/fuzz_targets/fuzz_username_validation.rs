//! Fuzz target for username validation.
//!
//! Tests that the username validator handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = vibe_node::validation::validate_username(s);
    }

    // Invalid UTF-8 bytes become replacement chars
    let lossy = String::from_utf8_lossy(data);
    let _ = vibe_node::validation::validate_username(&lossy);
});
