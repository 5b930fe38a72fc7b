#![no_main]

use std::sync::{Arc, LazyLock};

use apache_avro::Schema;
use libfuzzer_sys::fuzz_target;
use logship_serializer::RecordDecoder;

const SCHEMA: &str = r#"{
    "type": "record",
    "name": "session",
    "fields": [
        {"name": "ng_source", "type": ["null", "string"]},
        {"name": "time", "type": ["null", "long"]},
        {"name": "medium", "type": ["null", "int"]},
        {"name": "ip_src", "type": ["null", "string"]},
        {"name": "ip_dst", "type": ["null", "string"]},
        {"name": "tcp_flags_seen", "type": ["null", "boolean"]},
        {"name": "latdec_src", "type": ["null", "double"]},
        {"name": "payload", "type": ["null", "bytes"]},
        {"name": "alias_host", "type": {"type": "array", "items": "string"}}
    ]
}"#;

static PARSED: LazyLock<Option<Arc<Schema>>> =
    LazyLock::new(|| Schema::parse_str(SCHEMA).ok().map(Arc::new));

// 임의 바이트 본문은 에러로 끝나야 하며 패닉은 허용되지 않음
fuzz_target!(|data: &[u8]| {
    if let Some(schema) = PARSED.as_ref() {
        let _ = RecordDecoder.decode(Arc::clone(schema), data);
    }
});
