#![no_main]

use libfuzzer_sys::fuzz_target;
use logship_serializer::derive_decoder_name;

fuzz_target!(|data: &[u8]| {
    if let Ok(file) = std::str::from_utf8(data) {
        if let Some(name) = derive_decoder_name(file) {
            assert!(!name.is_empty());
            assert!(file.contains(name.as_str()));
        }
    }
});
