#![no_main]

use libfuzzer_sys::fuzz_target;
use unitgen::cases::{self, Namespace};

fuzz_target!(|data: &[u8]| {
    // Model output is text; invalid UTF-8 never reaches the case parser
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = cases::parse_cases(s, &Namespace::math());
    }
});
