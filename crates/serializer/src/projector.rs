//! 문서 투영 -- 디코딩된 레코드를 Logstash 형식 문서로 변환합니다.
//!
//! # 출력 형식
//! ```text
//! {
//!   "@fields": { "ip_src": "8.8.8.8", ... },
//!   "location_src": [lon, lat] | {"lat": .., "lon": ..},
//!   "location_dst": ...,
//!   "@timestamp": "2015-03-03T16:57:37.000+0000",
//!   "@source": "eb-rng-aptdec1"
//! }
//! ```
//!
//! 필드는 스키마 선언 순서대로 처리되며, null 값은 건너뜁니다.
//! 정책 게이트(제외 우선, 포함 또는 `*`)를 통과한 필드만 출력 대상이 됩니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use logship_core::config::WILDCARD;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::config::ConfigStore;
use crate::decoder::{DecodedRecord, stringify};

/// 포착 시각 필드
pub const FIELD_TIME: &str = "time";
/// 실제 이벤트 발생 시각 필드
pub const FIELD_EVENT_TIME: &str = "event_time";
/// 장비 유형 필드 (포착 후 출력도 함)
pub const FIELD_DEVICE_TYPE: &str = "device_type";
/// 레코드 안의 디코더 이름 필드
pub const FIELD_NG_SOURCE: &str = "ng_source";

const PREFIX_LAT_SRC: &str = "latdec_src";
const PREFIX_LAT_DST: &str = "latdec_dst";
const PREFIX_LON_SRC: &str = "longdec_src";
const PREFIX_LON_DST: &str = "longdec_dst";

/// 이 버전을 넘으면 좌표를 객체 형식으로 출력
const LEGACY_GEO_MAX_VERSION: u32 = 3;

const SECONDS_PER_HOUR: i64 = 3600;

/// `yyyy-MM-dd'T'HH:mm:ss.SSS+0000`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// 지리 좌표
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoPoint {
    /// 구형 출력: `[lon, lat]`
    Pair { lon: f64, lat: f64 },
    /// 신형 출력: `{"lat": .., "lon": ..}`
    Object { lat: f64, lon: f64 },
}

impl GeoPoint {
    fn new(lat: f64, lon: f64, output_format_version: u32) -> Self {
        if output_format_version > LEGACY_GEO_MAX_VERSION {
            Self::Object { lat, lon }
        } else {
            Self::Pair { lon, lat }
        }
    }

    pub fn to_json(&self) -> Value {
        match *self {
            Self::Pair { lon, lat } => json!([lon, lat]),
            Self::Object { lat, lon } => json!({ "lat": lat, "lon": lon }),
        }
    }
}

/// 투영된 문서
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedDocument {
    /// `@fields` 내용 (모두 문자열)
    pub fields: Map<String, Value>,
    pub location_src: Option<GeoPoint>,
    pub location_dst: Option<GeoPoint>,
    /// 쓸 수 있는 시각이 없으면 `None`
    pub timestamp: Option<String>,
    pub source: String,
}

impl ProjectedDocument {
    /// 인덱스에 보낼 JSON 객체로 변환합니다.
    pub fn to_json(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("@fields".to_owned(), Value::Object(self.fields.clone()));
        if let Some(point) = &self.location_src {
            doc.insert("location_src".to_owned(), point.to_json());
        }
        if let Some(point) = &self.location_dst {
            doc.insert("location_dst".to_owned(), point.to_json());
        }
        if let Some(ts) = &self.timestamp {
            doc.insert("@timestamp".to_owned(), Value::String(ts.clone()));
        }
        doc.insert("@source".to_owned(), Value::String(self.source.clone()));
        Value::Object(doc)
    }

    /// `@fields` 값 조회
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// 문서의 `@source`로 쓸 이름을 정합니다.
///
/// 레코드의 `ng_source`가 비어 있지 않으면 그것을, 아니면 파일 이름에서 얻은 디코더 이름을 씁니다.
pub fn source_name(record: &DecodedRecord, file_decoder: Option<&str>) -> String {
    record
        .string(FIELD_NG_SOURCE)
        .filter(|name| !name.is_empty())
        .or_else(|| file_decoder.map(str::to_owned))
        .unwrap_or_default()
}

/// 초 단위 epoch를 UTC 문자열로 변환합니다.
///
/// ```
/// use logship_serializer::projector::format_timestamp;
///
/// assert_eq!(format_timestamp(500).as_deref(), Some("1970-01-01T00:08:20.000+0000"));
/// ```
pub fn format_timestamp(epoch_seconds: i64) -> Option<String> {
    let millis = epoch_seconds.checked_mul(1000)?;
    let time: DateTime<Utc> = DateTime::from_timestamp_millis(millis)?;
    Some(time.format(TIMESTAMP_FORMAT).to_string())
}

/// 레코드 처리 중 포착한 예약 필드
#[derive(Debug, Default)]
struct Captured {
    time: i64,
    event_time: i64,
    device_type: Option<String>,
    lat_src: Option<String>,
    lat_dst: Option<String>,
    lon_src: Option<String>,
    lon_dst: Option<String>,
}

/// 정책 저장소를 참조하는 문서 투영기
#[derive(Debug, Clone)]
pub struct DocumentProjector {
    config: Arc<ConfigStore>,
}

impl DocumentProjector {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// 레코드 하나를 문서로 투영합니다.
    pub fn project(&self, record: &DecodedRecord, source_name: &str) -> ProjectedDocument {
        let excluded = self.config.excluded_fields(source_name);
        let included = self.config.included_fields(source_name);
        let include_all = included.contains(WILDCARD);

        let mut captured = Captured::default();
        let mut fields = Map::new();

        for field in record.fields() {
            if field.is_null() {
                continue;
            }
            if excluded.contains(field.name) || !(include_all || included.contains(field.name)) {
                continue;
            }
            let Some(text) = stringify(field.value) else {
                continue;
            };

            match field.name {
                FIELD_TIME => {
                    captured.time = parse_epoch(field.name, &text).unwrap_or(0);
                    continue;
                }
                FIELD_EVENT_TIME => {
                    captured.event_time = parse_epoch(field.name, &text).unwrap_or(0);
                    continue;
                }
                name if name.starts_with(PREFIX_LAT_SRC) => {
                    captured.lat_src = Some(text);
                    continue;
                }
                name if name.starts_with(PREFIX_LAT_DST) => {
                    captured.lat_dst = Some(text);
                    continue;
                }
                name if name.starts_with(PREFIX_LON_SRC) => {
                    captured.lon_src = Some(text);
                    continue;
                }
                name if name.starts_with(PREFIX_LON_DST) => {
                    captured.lon_dst = Some(text);
                    continue;
                }
                FIELD_DEVICE_TYPE => captured.device_type = Some(text.clone()),
                _ => {}
            }

            let mut text = match self.config.truncation_length(field.name) {
                Some(max) => truncate_chars(&text, max).to_owned(),
                None => text,
            };
            if field.declares_boolean() {
                text = normalize_boolean(text);
            }
            fields.insert(field.name.to_owned(), Value::String(text));
        }

        let version = self.config.output_format_version();
        let location_src = geo_point(
            captured.lat_src.as_deref(),
            captured.lon_src.as_deref(),
            version,
        );
        let location_dst = geo_point(
            captured.lat_dst.as_deref(),
            captured.lon_dst.as_deref(),
            version,
        );

        let timestamp = self
            .effective_time(record, &captured)
            .and_then(format_timestamp);

        ProjectedDocument {
            fields,
            location_src,
            location_dst,
            timestamp,
            source: source_name.to_owned(),
        }
    }

    /// 문서 시각(초)을 정합니다: 보정된 event_time, time, 레코드의 원시 time 순.
    fn effective_time(&self, record: &DecodedRecord, captured: &Captured) -> Option<i64> {
        if captured.event_time > 0 {
            let correction = captured
                .device_type
                .as_deref()
                .and_then(|device| self.config.time_correction(device))
                .unwrap_or(0);
            return Some(
                captured
                    .event_time
                    .saturating_add(correction.saturating_mul(SECONDS_PER_HOUR)),
            );
        }
        if captured.time > 0 {
            return Some(captured.time);
        }
        record
            .string(FIELD_TIME)
            .and_then(|raw| parse_epoch(FIELD_TIME, &raw))
    }
}

fn parse_epoch(field: &str, text: &str) -> Option<i64> {
    match text.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field, value = text, error = %e, "non-numeric time field ignored");
            None
        }
    }
}

fn geo_point(lat: Option<&str>, lon: Option<&str>, version: u32) -> Option<GeoPoint> {
    let (lat, lon) = (lat?, lon?);
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => Some(GeoPoint::new(lat, lon, version)),
        _ => {
            warn!(lat, lon, "non-numeric coordinates ignored");
            None
        }
    }
}

/// 최대 `max`개 문자로 자릅니다. 짧은 값은 그대로 둡니다.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn normalize_boolean(text: String) -> String {
    match text.as_str() {
        "T" => "true".to_owned(),
        "F" => "false".to_owned(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::RecordDecoder;
    use apache_avro::types::{Record, Value as AvroValue};
    use apache_avro::{Schema, to_avro_datum};
    use logship_core::config::{FieldRule, SerializerConfig};
    use proptest::prelude::*;

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "session",
        "fields": [
            {"name": "ng_source", "type": ["null", "string"]},
            {"name": "time", "type": ["null", "long"]},
            {"name": "event_time", "type": ["null", "long"]},
            {"name": "device_type", "type": ["null", "string"]},
            {"name": "ip_src", "type": ["null", "string"]},
            {"name": "alias_host", "type": ["null", "string"]},
            {"name": "payload", "type": ["null", "string"]},
            {"name": "flag", "type": ["null", "boolean", "string"]},
            {"name": "note", "type": ["null", "string"]},
            {"name": "latdec_src", "type": ["null", "string"]},
            {"name": "longdec_src", "type": ["null", "string"]},
            {"name": "latdec_dst", "type": ["null", "string"]},
            {"name": "longdec_dst", "type": ["null", "string"]}
        ]
    }"#;

    fn null() -> AvroValue {
        AvroValue::Union(0, Box::new(AvroValue::Null))
    }

    fn s(text: &str) -> AvroValue {
        AvroValue::Union(1, Box::new(AvroValue::String(text.to_owned())))
    }

    fn long(v: i64) -> AvroValue {
        AvroValue::Union(1, Box::new(AvroValue::Long(v)))
    }

    /// 지정하지 않은 필드는 모두 null
    fn record(values: &[(&str, AvroValue)]) -> DecodedRecord {
        let schema = Arc::new(Schema::parse_str(SCHEMA).unwrap());
        let mut rec = Record::new(&schema).unwrap();
        for name in [
            "ng_source",
            "time",
            "event_time",
            "device_type",
            "ip_src",
            "alias_host",
            "payload",
            "flag",
            "note",
            "latdec_src",
            "longdec_src",
            "latdec_dst",
            "longdec_dst",
        ] {
            rec.put(name, null());
        }
        for (name, value) in values {
            rec.put(name, value.clone());
        }
        let bytes = to_avro_datum(&schema, rec).unwrap();
        RecordDecoder.decode(schema, &bytes).unwrap()
    }

    fn include_all() -> FieldRule {
        FieldRule {
            decoders: vec!["*".to_owned()],
            fields: Vec::new(),
            include_all_fields: true,
        }
    }

    fn projector(config: SerializerConfig) -> DocumentProjector {
        DocumentProjector::new(Arc::new(ConfigStore::from_config(&config)))
    }

    fn open_projector() -> DocumentProjector {
        projector(SerializerConfig {
            include: vec![include_all()],
            ..Default::default()
        })
    }

    #[test]
    fn nothing_included_by_default() {
        let doc = projector(SerializerConfig::default())
            .project(&record(&[("ip_src", s("8.8.8.8"))]), "dec");
        assert!(doc.fields.is_empty());
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let doc = projector(SerializerConfig {
            include: vec![include_all()],
            exclude: vec![FieldRule {
                decoders: vec!["*".to_owned()],
                fields: vec!["payload".to_owned()],
                include_all_fields: false,
            }],
            ..Default::default()
        })
        .project(
            &record(&[("ip_src", s("8.8.8.8")), ("payload", s("secret"))]),
            "dec",
        );
        assert_eq!(doc.field("ip_src"), Some("8.8.8.8"));
        assert!(doc.field("payload").is_none());
    }

    #[test]
    fn explicit_include_list_limits_fields() {
        let doc = projector(SerializerConfig {
            include: vec![FieldRule {
                decoders: vec!["eb-gb-aptlog1".to_owned()],
                fields: vec!["ip_src".to_owned()],
                include_all_fields: false,
            }],
            ..Default::default()
        })
        .project(
            &record(&[("ip_src", s("8.8.8.8")), ("note", s("n"))]),
            "eb-gb-aptlog1",
        );
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.field("ip_src"), Some("8.8.8.8"));
    }

    #[test]
    fn null_fields_are_skipped() {
        let doc = open_projector().project(&record(&[("ip_src", s("1.1.1.1"))]), "dec");
        assert!(!doc.fields.contains_key("note"));
        assert!(!doc.fields.contains_key("payload"));
    }

    #[test]
    fn fields_keep_schema_order() {
        let doc = open_projector().project(
            &record(&[("note", s("z")), ("ip_src", s("a")), ("alias_host", s("m"))]),
            "dec",
        );
        let keys: Vec<_> = doc.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ip_src", "alias_host", "note"]);
    }

    #[test]
    fn truncation_clips_to_char_count() {
        let mut config = SerializerConfig {
            include: vec![include_all()],
            ..Default::default()
        };
        config.truncate.insert("alias_host".to_owned(), 4);
        config.truncate.insert("note".to_owned(), 10);
        let doc = projector(config).project(
            &record(&[("alias_host", s("한국어호스트")), ("note", s("short"))]),
            "dec",
        );
        assert_eq!(doc.field("alias_host"), Some("한국어호"));
        assert_eq!(doc.field("note"), Some("short"));
    }

    #[test]
    fn boolean_normalization_only_for_boolean_declarations() {
        let flag_doc = open_projector().project(
            &record(&[("flag", AvroValue::Union(2, Box::new(AvroValue::String("T".into()))))]),
            "dec",
        );
        assert_eq!(flag_doc.field("flag"), Some("true"));

        let bool_doc = open_projector().project(
            &record(&[("flag", AvroValue::Union(1, Box::new(AvroValue::Boolean(false))))]),
            "dec",
        );
        assert_eq!(bool_doc.field("flag"), Some("false"));

        let note_doc = open_projector().project(&record(&[("note", s("T"))]), "dec");
        assert_eq!(note_doc.field("note"), Some("T"));
    }

    #[test]
    fn reserved_fields_are_not_emitted() {
        let doc = open_projector().project(
            &record(&[
                ("time", long(500)),
                ("event_time", long(1000)),
                ("latdec_src", s("37.5")),
                ("longdec_src", s("127.0")),
                ("device_type", s("ciscoasa")),
            ]),
            "dec",
        );
        for name in ["time", "event_time", "latdec_src", "longdec_src"] {
            assert!(!doc.fields.contains_key(name), "{name} leaked");
        }
        assert_eq!(doc.field("device_type"), Some("ciscoasa"));
    }

    #[test]
    fn geo_pair_for_legacy_version() {
        let doc = open_projector().project(
            &record(&[("latdec_src", s("37.5")), ("longdec_src", s("127.0"))]),
            "dec",
        );
        assert_eq!(doc.location_src, Some(GeoPoint::Pair { lon: 127.0, lat: 37.5 }));
        assert_eq!(doc.to_json()["location_src"], json!([127.0, 37.5]));
        assert!(doc.location_dst.is_none());
    }

    #[test]
    fn geo_object_for_newer_version() {
        let doc = projector(SerializerConfig {
            include: vec![include_all()],
            kibana_version: 4,
            ..Default::default()
        })
        .project(
            &record(&[("latdec_dst", s("51.5")), ("longdec_dst", s("-0.12"))]),
            "dec",
        );
        assert_eq!(doc.to_json()["location_dst"], json!({"lat": 51.5, "lon": -0.12}));
    }

    #[test]
    fn partial_or_non_numeric_geo_is_suppressed() {
        let partial = open_projector().project(&record(&[("latdec_src", s("37.5"))]), "dec");
        assert!(partial.location_src.is_none());
        assert!(partial.to_json().get("location_src").is_none());

        let garbage = open_projector().project(
            &record(&[("latdec_src", s("north")), ("longdec_src", s("127.0"))]),
            "dec",
        );
        assert!(garbage.location_src.is_none());
    }

    #[test]
    fn event_time_with_correction_wins() {
        let mut config = SerializerConfig {
            include: vec![include_all()],
            ..Default::default()
        };
        config.time_correction.insert("checkpointfw1".to_owned(), 2);
        let doc = projector(config).project(
            &record(&[
                ("event_time", long(1000)),
                ("time", long(500)),
                ("device_type", s("checkpointfw1")),
            ]),
            "dec",
        );
        assert_eq!(doc.timestamp, format_timestamp(1000 + 7200));
        assert_eq!(doc.timestamp.as_deref(), Some("1970-01-01T02:16:40.000+0000"));
    }

    #[test]
    fn event_time_without_device_entry_is_uncorrected() {
        let doc = open_projector().project(
            &record(&[("event_time", long(1000)), ("device_type", s("unknown"))]),
            "dec",
        );
        assert_eq!(doc.timestamp, format_timestamp(1000));
    }

    #[test]
    fn capture_time_used_without_event_time() {
        let doc = open_projector().project(&record(&[("time", long(500))]), "dec");
        assert_eq!(doc.timestamp.as_deref(), Some("1970-01-01T00:08:20.000+0000"));
    }

    #[test]
    fn raw_time_bypasses_policy_gate() {
        let doc = projector(SerializerConfig::default())
            .project(&record(&[("time", long(1_425_401_857))]), "dec");
        assert!(doc.fields.is_empty());
        assert_eq!(doc.timestamp.as_deref(), Some("2015-03-03T16:57:37.000+0000"));
    }

    #[test]
    fn no_time_omits_timestamp() {
        let doc = open_projector().project(&record(&[("ip_src", s("8.8.8.8"))]), "dec");
        assert!(doc.timestamp.is_none());
        assert!(doc.to_json().get("@timestamp").is_none());
    }

    #[test]
    fn source_prefers_ng_source() {
        let rec = record(&[("ng_source", s("eb-rng-aptdec1"))]);
        assert_eq!(source_name(&rec, Some("file-decoder")), "eb-rng-aptdec1");

        let empty = record(&[("ng_source", s(""))]);
        assert_eq!(source_name(&empty, Some("file-decoder")), "file-decoder");

        let missing = record(&[]);
        assert_eq!(source_name(&missing, None), "");
    }

    #[test]
    fn json_layout() {
        let doc = open_projector().project(
            &record(&[("ip_src", s("8.8.8.8")), ("time", long(500))]),
            "eb-rng-aptdec1",
        );
        let json = doc.to_json();
        assert_eq!(json["@fields"]["ip_src"], "8.8.8.8");
        assert_eq!(json["@source"], "eb-rng-aptdec1");
        assert_eq!(json["@timestamp"], "1970-01-01T00:08:20.000+0000");
    }

    proptest! {
        #[test]
        fn truncation_never_lengthens_and_is_idempotent(text in "\\PC{0,40}", max in 0usize..50) {
            let once = truncate_chars(&text, max);
            prop_assert!(once.chars().count() <= max);
            prop_assert!(once.chars().count() <= text.chars().count());
            prop_assert_eq!(truncate_chars(once, max), once);
            prop_assert!(text.starts_with(once));
        }
    }
}
