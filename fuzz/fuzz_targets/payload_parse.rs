//! Fuzz target for `longText` payload parsing.

#![no_main]

use labelbridge::document::DescriptionPayload;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = DescriptionPayload::parse(text);
    }
});
