//! Fuzz target for viewer document parsing and shape decoding.
//!
//! Feeds arbitrary bytes to the document parser and decodes every drawing of
//! documents that parse, checking for panics, crashes, or hangs.

#![no_main]

use labelbridge::document::{decode_shape, from_document_slice};

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(document) = from_document_slice(data) else {
        return;
    };
    for slice in 0..document.slice_count() {
        if let Some(container) = document.container(slice) {
            for entry in container.entries.values() {
                let _ = decode_shape(entry);
            }
        }
    }
});
