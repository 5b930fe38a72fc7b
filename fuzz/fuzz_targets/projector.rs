#![no_main]

use std::sync::Arc;

use apache_avro::Schema;
use apache_avro::types::{Record, Value};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logship_core::config::{FieldRule, SerializerConfig};
use logship_serializer::{ConfigStore, DecodedRecord, DocumentProjector};

const SCHEMA: &str = r#"{
    "type": "record",
    "name": "session",
    "fields": [
        {"name": "time", "type": "string"},
        {"name": "event_time", "type": "string"},
        {"name": "device_type", "type": "string"},
        {"name": "latdec_src", "type": "string"},
        {"name": "longdec_src", "type": "string"},
        {"name": "alias_host", "type": "string"},
        {"name": "flag", "type": "boolean"}
    ]
}"#;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    time: String,
    event_time: String,
    device_type: String,
    lat: String,
    lon: String,
    alias_host: String,
    flag: bool,
    truncate: u8,
    correction: i64,
    kibana_version: u8,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(schema) = Schema::parse_str(SCHEMA) else {
        return;
    };

    let mut config = SerializerConfig {
        kibana_version: u32::from(input.kibana_version).max(1),
        include: vec![FieldRule {
            decoders: vec!["*".to_owned()],
            fields: Vec::new(),
            include_all_fields: true,
        }],
        ..Default::default()
    };
    config
        .truncate
        .insert("alias_host".to_owned(), usize::from(input.truncate));
    config
        .time_correction
        .insert(input.device_type.clone(), input.correction);

    let Some(mut record) = Record::new(&schema) else {
        return;
    };
    record.put("time", input.time);
    record.put("event_time", input.event_time);
    record.put("device_type", input.device_type);
    record.put("latdec_src", input.lat);
    record.put("longdec_src", input.lon);
    record.put("alias_host", input.alias_host);
    record.put("flag", Value::Boolean(input.flag));

    let Ok(decoded) = DecodedRecord::from_value(Arc::new(schema.clone()), Value::from(record))
    else {
        return;
    };
    let projector = DocumentProjector::new(Arc::new(ConfigStore::from_config(&config)));
    let _ = projector.project(&decoded, "fuzz").to_json();
});
