#![no_main]

use boxforge_proto::decode_line;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        // Decoding is supposed to be total: garbage input decodes to `None`
        // rather than panicking or erroring.
        let _ = decode_line(line);
    }
});
