//! Fuzz target for client-supplied document ids.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vibe_store::DocumentId;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(id) = DocumentId::parse(s) {
            // Accepted ids are normalized and stable under reparsing
            assert_eq!(id.as_str().len(), 32);
            assert_eq!(DocumentId::parse(id.as_str()).ok(), Some(id));
        }
    }
});
