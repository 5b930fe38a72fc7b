#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`config`]: 로드 후 불변인 필드 정책 저장소 ([`ConfigStore`])
//! - [`schema`]: 스키마 해석, 지문 캐시, 재시도, 디코더 이름 추출
//! - [`decoder`]: 스키마 기반 Avro 레코드 디코딩
//! - [`projector`]: Logstash 형식 문서 투영
//! - [`privacy`]: 사설 주소 필터 (EventInterceptor 구현)
//! - [`pipeline`]: 직렬화기 (EventSerializer 구현) 및 배치 파이프라인
//! - [`error`]: 도메인 에러 타입

pub mod config;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod privacy;
pub mod projector;
pub mod schema;

// --- 주요 타입 re-export ---

// 설정
pub use config::ConfigStore;

// 에러
pub use error::SerializerError;

// 스키마
pub use schema::{
    FileSchemaSource, ResolvedSchema, RetryPolicy, SchemaCache, SchemaCacheEntry, SchemaResolver,
    SchemaSource, derive_decoder_name,
};

// 디코더
pub use decoder::{DecodedField, DecodedRecord, RecordDecoder};

// 투영
pub use projector::{DocumentProjector, GeoPoint, ProjectedDocument};

// 필터
pub use privacy::PrivacyFilter;

// 파이프라인
pub use pipeline::{AvroDocumentSerializer, EventPipeline, EventPipelineBuilder, PipelineStats};
