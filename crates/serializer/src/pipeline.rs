//! 이벤트 파이프라인 -- 필터링과 문서 투영의 전체 흐름
//!
//! # 내부 아키텍처
//! ```text
//! Vec<Event> -> PrivacyFilter -> SchemaResolver -> RecordDecoder -> DocumentProjector -> Vec<JSON>
//! ```
//!
//! 필터와 직렬화기는 같은 [`SchemaResolver`]를 공유하므로 지문 캐시도 공유됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use logship_core::error::LogshipError;
use logship_core::event::Event;
use logship_core::metrics as m;
use logship_core::pipeline::{EventInterceptor, EventSerializer};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::ConfigStore;
use crate::decoder::RecordDecoder;
use crate::error::SerializerError;
use crate::privacy::PrivacyFilter;
use crate::projector::{DocumentProjector, ProjectedDocument, source_name};
use crate::schema::{FileSchemaSource, RetryPolicy, SchemaResolver, SchemaSource};

/// Avro 이벤트를 Logstash 형식 JSON 문서로 바꾸는 직렬화기
pub struct AvroDocumentSerializer<S: SchemaSource = FileSchemaSource> {
    resolver: Arc<SchemaResolver<S>>,
    decoder: RecordDecoder,
    projector: DocumentProjector,
}

impl<S: SchemaSource> AvroDocumentSerializer<S> {
    pub fn new(config: Arc<ConfigStore>, resolver: Arc<SchemaResolver<S>>) -> Self {
        Self {
            resolver,
            decoder: RecordDecoder,
            projector: DocumentProjector::new(config),
        }
    }

    /// 이벤트 하나를 투영합니다. 스키마나 디코딩 실패는 에러로 돌려줍니다.
    pub async fn project_event(&self, event: &Event) -> Result<ProjectedDocument, SerializerError> {
        let resolved = self.resolver.resolve(event).await?;
        let record = self.decoder.decode(resolved.schema, &event.body)?;
        let source = source_name(&record, resolved.decoder_name.as_deref());
        Ok(self.projector.project(&record, &source))
    }
}

impl<S: SchemaSource> EventSerializer for AvroDocumentSerializer<S> {
    fn name(&self) -> &str {
        "avro-document"
    }

    async fn serialize(&self, event: &Event) -> Result<Option<serde_json::Value>, LogshipError> {
        match self.project_event(event).await {
            Ok(doc) => {
                metrics::counter!(m::SERIALIZER_DOCUMENTS_TOTAL).increment(1);
                Ok(Some(doc.to_json()))
            }
            Err(e) => {
                match &e {
                    SerializerError::SchemaUnavailable { .. } | SerializerError::SchemaRead { .. } => {
                        error!(event = %event, error = %e, "no valid schema, event skipped");
                    }
                    SerializerError::IncompleteRecord(_) => {
                        debug!(event = %event, error = %e, "incomplete record skipped");
                    }
                    _ => warn!(event = %event, error = %e, "failed to read event data"),
                }
                metrics::counter!(m::SERIALIZER_RECORDS_DROPPED_TOTAL, m::LABEL_REASON => e.kind())
                    .increment(1);
                Ok(None)
            }
        }
    }
}

/// 파이프라인 처리 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// 입력된 이벤트 수
    pub received: u64,
    /// 사설 주소 필터로 제거된 이벤트 수
    pub filtered: u64,
    /// 문서로 변환된 이벤트 수
    pub projected: u64,
    /// 스키마/디코딩 실패로 버려진 이벤트 수
    pub failed: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    received: AtomicU64,
    filtered: AtomicU64,
    projected: AtomicU64,
    failed: AtomicU64,
}

/// 필터 + 직렬화기 배치 파이프라인
///
/// # 사용 예시
/// ```no_run
/// # async fn example(events: Vec<logship_core::Event>) {
/// use std::sync::Arc;
/// use logship_serializer::{ConfigStore, EventPipelineBuilder};
///
/// let config = Arc::new(ConfigStore::load_or_default("logship.toml").await);
/// let pipeline = EventPipelineBuilder::new().config(config).build();
/// for doc in pipeline.process_batch(events).await {
///     println!("{doc}");
/// }
/// # }
/// ```
pub struct EventPipeline<S: SchemaSource = FileSchemaSource> {
    config: Arc<ConfigStore>,
    resolver: Arc<SchemaResolver<S>>,
    filter: PrivacyFilter<S>,
    serializer: AvroDocumentSerializer<S>,
    stats: StatCounters,
}

impl<S: SchemaSource> EventPipeline<S> {
    /// 배치를 필터링한 뒤 남은 이벤트를 문서로 변환합니다.
    ///
    /// 문서 순서는 입력 순서를 따릅니다.
    pub async fn process_batch(&self, events: Vec<Event>) -> Vec<serde_json::Value> {
        let received = events.len();
        self.stats
            .received
            .fetch_add(received as u64, Ordering::Relaxed);

        let survivors = self.filter.intercept_batch(events).await;
        self.stats
            .filtered
            .fetch_add((received - survivors.len()) as u64, Ordering::Relaxed);

        let mut documents = Vec::with_capacity(survivors.len());
        for event in &survivors {
            match self.serializer.serialize(event).await {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) | Err(_) => {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.stats
            .projected
            .fetch_add(documents.len() as u64, Ordering::Relaxed);

        debug!(
            received,
            survivors = survivors.len(),
            documents = documents.len(),
            "batch processed"
        );
        documents
    }

    /// 현재까지의 처리 통계
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            received: self.stats.received.load(Ordering::Relaxed),
            filtered: self.stats.filtered.load(Ordering::Relaxed),
            projected: self.stats.projected.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<SchemaResolver<S>> {
        &self.resolver
    }

    pub fn filter(&self) -> &PrivacyFilter<S> {
        &self.filter
    }

    pub fn serializer(&self) -> &AvroDocumentSerializer<S> {
        &self.serializer
    }
}

/// 이벤트 파이프라인 빌더
pub struct EventPipelineBuilder {
    config: Option<Arc<ConfigStore>>,
    retry: Option<RetryPolicy>,
}

impl EventPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            retry: None,
        }
    }

    /// 정책 저장소를 지정합니다. 지정하지 않으면 기본 정책을 씁니다.
    pub fn config(mut self, config: Arc<ConfigStore>) -> Self {
        self.config = Some(config);
        self
    }

    /// 설정과 다른 재시도 정책을 지정합니다.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// 파일 시스템 스키마 원본으로 파이프라인을 빌드합니다.
    pub fn build(self) -> EventPipeline<FileSchemaSource> {
        self.build_with_source(FileSchemaSource)
    }

    /// 지정한 스키마 원본으로 파이프라인을 빌드합니다.
    pub fn build_with_source<S: SchemaSource>(self, source: S) -> EventPipeline<S> {
        let config = self.config.unwrap_or_default();
        let mut resolver = SchemaResolver::with_source(source, &config);
        if let Some(retry) = self.retry {
            resolver = resolver.with_retry_policy(retry);
        }
        let resolver = Arc::new(resolver);

        EventPipeline {
            filter: PrivacyFilter::new(Arc::clone(&config), Arc::clone(&resolver)),
            serializer: AvroDocumentSerializer::new(Arc::clone(&config), Arc::clone(&resolver)),
            config,
            resolver,
            stats: StatCounters::default(),
        }
    }
}

impl Default for EventPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::types::{Record, Value};
    use apache_avro::{Schema, to_avro_datum};
    use logship_core::config::{FieldRule, SerializerConfig};

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "session",
        "fields": [
            {"name": "ng_source", "type": "string"},
            {"name": "time", "type": "long"},
            {"name": "ip_src", "type": "string"},
            {"name": "ip_dst", "type": "string"}
        ]
    }"#;

    fn event(src: &str, dst: &str) -> Event {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let mut record = Record::new(&schema).unwrap();
        record.put("ng_source", Value::String("eb-rng-aptdec1".into()));
        record.put("time", Value::Long(1_425_401_857));
        record.put("ip_src", Value::String(src.into()));
        record.put("ip_dst", Value::String(dst.into()));
        Event::with_schema_literal(SCHEMA, to_avro_datum(&schema, record).unwrap())
    }

    fn config(filter: bool) -> Arc<ConfigStore> {
        Arc::new(ConfigStore::from_config(&SerializerConfig {
            ignore_private_addresses: filter,
            include: vec![FieldRule {
                decoders: vec!["*".to_owned()],
                fields: Vec::new(),
                include_all_fields: true,
            }],
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn serializer_produces_logstash_document() {
        let pipeline = EventPipelineBuilder::new().config(config(false)).build();
        let doc = pipeline
            .serializer()
            .serialize(&event("8.8.8.8", "1.1.1.1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["@source"], "eb-rng-aptdec1");
        assert_eq!(doc["@fields"]["ip_src"], "8.8.8.8");
        assert_eq!(doc["@fields"]["ng_source"], "eb-rng-aptdec1");
        assert_eq!(doc["@timestamp"], "2015-03-03T16:57:37.000+0000");
        assert_eq!(pipeline.serializer().name(), "avro-document");
    }

    #[tokio::test]
    async fn serializer_skips_event_without_schema() {
        let pipeline = EventPipelineBuilder::new().build();
        let result = pipeline
            .serializer()
            .serialize(&Event::new(Default::default(), vec![0u8]))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn batch_filters_then_projects() {
        let pipeline = EventPipelineBuilder::new().config(config(true)).build();
        let mut truncated = event("8.8.8.8", "1.1.1.1");
        truncated.body = truncated.body.slice(..3);

        let docs = pipeline
            .process_batch(vec![
                event("8.8.8.8", "1.1.1.1"),
                event("10.0.0.1", "1.1.1.1"),
                truncated,
                event("9.9.9.9", "8.8.4.4"),
            ])
            .await;

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["@fields"]["ip_src"], "8.8.8.8");
        assert_eq!(docs[1]["@fields"]["ip_src"], "9.9.9.9");
        assert_eq!(
            pipeline.stats(),
            PipelineStats {
                received: 4,
                filtered: 1,
                projected: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn builder_defaults_to_conservative_config() {
        let pipeline = EventPipelineBuilder::default().build();
        assert!(!pipeline.filter().enabled());
        assert_eq!(pipeline.config().output_format_version(), 3);
        assert_eq!(pipeline.resolver().retry_policy(), RetryPolicy::default());
        assert_eq!(pipeline.stats(), PipelineStats::default());
    }

    #[test]
    fn builder_applies_retry_override() {
        let retry = RetryPolicy {
            max_attempts: 2,
            interval: std::time::Duration::from_millis(5),
        };
        let pipeline = EventPipelineBuilder::new().retry_policy(retry).build();
        assert_eq!(pipeline.resolver().retry_policy(), retry);
    }
}
