//! Fuzz target for the delimited-text parser.
//!
//! Checks that delimiter detection and parsing never panic on malformed
//! bytes, including broken UTF-8 and unbalanced quotes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use medallion::Parser;
use medallion::input::detect_delimiter;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    if let Ok(delimiter) = detect_delimiter(data) {
        let _ = parser.parse_bytes(data, delimiter);
    }
    let _ = parser.parse_bytes(data, b',');
});
