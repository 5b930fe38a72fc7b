//! 레코드 디코더 -- 스키마와 바이트에서 레코드 하나를 복원합니다.
//!
//! 순수 함수로, 공유 상태가 없습니다. 스키마가 요구하는 바이트만 읽고
//! 남은 바이트는 무시합니다.

use std::io::ErrorKind;
use std::sync::Arc;

use apache_avro::Schema;
use apache_avro::schema::RecordField;
use apache_avro::types::Value;

use crate::error::SerializerError;

/// 디코딩된 레코드
///
/// 필드는 스키마에 선언된 순서를 유지하며, 각 필드의 선언 타입을 함께 제공합니다.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    schema: Arc<Schema>,
    values: Vec<(String, Value)>,
}

/// 디코딩된 필드 하나에 대한 참조
#[derive(Debug, Clone, Copy)]
pub struct DecodedField<'a> {
    pub name: &'a str,
    /// 스키마에 선언된 타입
    pub declared: &'a Schema,
    pub value: &'a Value,
}

impl DecodedField<'_> {
    /// 선언 타입이 boolean 이거나 boolean을 포함한 union 인지
    pub fn declares_boolean(&self) -> bool {
        match self.declared {
            Schema::Boolean => true,
            Schema::Union(union) => union
                .variants()
                .iter()
                .any(|variant| matches!(variant, Schema::Boolean)),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        is_null(self.value)
    }
}

impl DecodedRecord {
    /// 이미 디코딩된 Avro 값으로 레코드를 구성합니다.
    pub fn from_value(schema: Arc<Schema>, value: Value) -> Result<Self, SerializerError> {
        if !matches!(schema.as_ref(), Schema::Record(_)) {
            return Err(SerializerError::MalformedRecord(
                "top-level schema is not a record".to_owned(),
            ));
        }
        match value {
            Value::Record(values) => Ok(Self { schema, values }),
            other => Err(SerializerError::MalformedRecord(format!(
                "expected record value, got {other:?}"
            ))),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// 스키마 선언 순서대로 필드를 순회합니다.
    pub fn fields(&self) -> impl Iterator<Item = DecodedField<'_>> {
        self.values
            .iter()
            .zip(self.record_fields())
            .map(|((name, value), field)| DecodedField {
                name,
                declared: &field.schema,
                value,
            })
    }

    /// 이름으로 필드 값을 찾습니다.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// 이름으로 필드 값을 찾아 문자열로 변환합니다. null이면 `None`.
    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(stringify)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn record_fields(&self) -> &[RecordField] {
        match self.schema.as_ref() {
            Schema::Record(record) => &record.fields,
            _ => &[],
        }
    }
}

/// 스키마 기반 Avro 바이너리 디코더
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordDecoder;

impl RecordDecoder {
    /// 바이트에서 레코드 하나를 디코딩합니다.
    ///
    /// 바이트가 모자라면 [`SerializerError::IncompleteRecord`],
    /// 그 밖의 실패는 [`SerializerError::MalformedRecord`] 입니다.
    pub fn decode(&self, schema: Arc<Schema>, body: &[u8]) -> Result<DecodedRecord, SerializerError> {
        if !matches!(schema.as_ref(), Schema::Record(_)) {
            return Err(SerializerError::MalformedRecord(
                "top-level schema is not a record".to_owned(),
            ));
        }

        let mut reader = body;
        let value = apache_avro::from_avro_datum(&schema, &mut reader, None).map_err(classify)?;
        DecodedRecord::from_value(schema, value)
    }
}

fn classify(err: apache_avro::Error) -> SerializerError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if io.kind() == ErrorKind::UnexpectedEof {
                return SerializerError::IncompleteRecord(err.to_string());
            }
        }
        source = current.source();
    }

    let message = err.to_string();
    if message.contains("failed to fill whole buffer") {
        SerializerError::IncompleteRecord(message)
    } else {
        SerializerError::MalformedRecord(message)
    }
}

/// null 이거나 null로 해석된 union 인지
pub fn is_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Union(_, inner) => is_null(inner),
        _ => false,
    }
}

/// Avro 값을 문서용 문자열로 변환합니다. null은 `None`.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Union(_, inner) => stringify(inner),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Long(l) => Some(l.to_string()),
        Value::Float(f) => Some(format_decimal(f64::from(*f), &format!("{f:e}"))),
        Value::Double(d) => Some(format_decimal(*d, &format!("{d:e}"))),
        Value::String(s) | Value::Enum(_, s) => Some(s.clone()),
        Value::Bytes(b) | Value::Fixed(_, b) => Some(String::from_utf8_lossy(b).into_owned()),
        Value::Uuid(u) => Some(u.to_string()),
        other => serde_json::Value::try_from(other.clone())
            .ok()
            .map(|json| json.to_string()),
    }
}

/// 부동소수점 값을 JVM `toString` 표기로 변환합니다.
///
/// `scientific`은 원래 타입(`f32`/`f64`)의 `{:e}` 출력이어야 최단 자릿수가 유지됩니다.
/// 크기가 `[1e-3, 1e7)` 범위이면 소수 표기, 그 밖은 `d.dddE<n>` 표기이며
/// 소수부는 항상 한 자리 이상입니다.
fn format_decimal(value: f64, scientific: &str) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }

    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific.to_owned();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific.to_owned();
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let (lead, rest) = digits.split_at(1);

    if !(-3..7).contains(&exponent) {
        let fraction = if rest.is_empty() { "0" } else { rest };
        return format!("{sign}{lead}.{fraction}E{exponent}");
    }

    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }

    let int_len = exponent as usize + 1;
    if digits.len() <= int_len {
        let padding = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{padding}.0")
    } else {
        let (int_part, fraction) = digits.split_at(int_len);
        format!("{sign}{int_part}.{fraction}")
    }
}
