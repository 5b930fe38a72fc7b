//! 인바운드 이벤트 -- 스트리밍 파이프라인이 전달하는 기본 단위
//!
//! [`Event`]는 Flume 이벤트와 동일한 모양(헤더 맵 + 불투명한 바이트 본문)을 가집니다.
//! 본문은 Avro 바이너리 레코드이며, 스키마는 헤더를 통해 참조됩니다.
//!
//! # 스키마 참조 헤더
//! - [`HEADER_SCHEMA_LITERAL`]: 스키마 JSON 전체가 헤더에 포함됨 (자기 기술형)
//! - [`HEADER_SCHEMA_HASH`] + [`HEADER_FILE`]: 지문(fingerprint)과 원본 컨테이너 파일 경로

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

/// 인라인 스키마 리터럴 헤더
pub const HEADER_SCHEMA_LITERAL: &str = "flume.avro.schema.literal";
/// 스키마 지문 헤더
pub const HEADER_SCHEMA_HASH: &str = "flume.avro.schema.hash";
/// 원본 Avro 컨테이너 파일 경로 헤더
pub const HEADER_FILE: &str = "file";

/// 스트리밍 파이프라인에서 수신한 단일 이벤트
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// 이벤트 헤더
    pub headers: HashMap<String, String>,
    /// Avro 바이너리 본문
    pub body: Bytes,
}

impl Event {
    /// 헤더와 본문으로 이벤트를 생성합니다.
    pub fn new(headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// 인라인 스키마 리터럴을 가진 이벤트를 생성합니다.
    pub fn with_schema_literal(schema_json: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let mut headers = HashMap::new();
        headers.insert(HEADER_SCHEMA_LITERAL.to_owned(), schema_json.into());
        Self::new(headers, body)
    }

    /// 스키마 지문과 원본 파일 경로를 가진 이벤트를 생성합니다.
    pub fn with_schema_hash(
        fingerprint: impl Into<String>,
        file: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        let mut headers = HashMap::new();
        headers.insert(HEADER_SCHEMA_HASH.to_owned(), fingerprint.into());
        headers.insert(HEADER_FILE.to_owned(), file.into());
        Self::new(headers, body)
    }

    /// 헤더 값을 조회합니다.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// 인라인 스키마 리터럴
    pub fn schema_literal(&self) -> Option<&str> {
        self.header(HEADER_SCHEMA_LITERAL)
    }

    /// 스키마 지문
    pub fn schema_hash(&self) -> Option<&str> {
        self.header(HEADER_SCHEMA_HASH)
    }

    /// 원본 컨테이너 파일 경로
    pub fn file(&self) -> Option<&str> {
        self.header(HEADER_FILE)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event file={} hash={} body={}B",
            self.file().unwrap_or("-"),
            self.schema_hash().unwrap_or("-"),
            self.body.len(),
        )
    }
}
