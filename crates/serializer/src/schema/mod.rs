//! 스키마 해석 -- 이벤트 헤더로부터 Avro 스키마를 확보합니다.
//!
//! # 해석 순서
//! 1. 인라인 리터럴 헤더가 있으면 파싱해서 반환 (캐시 미사용)
//! 2. 지문이 캐시와 일치하면 캐시된 스키마 반환 (I/O 없음)
//! 3. 원본 컨테이너 파일의 헤더를 읽음. 실패하면 일정 간격으로 재시도
//!
//! 재시도 루프는 캐시 잠금을 잡지 않으므로 한 레코드의 재시도가
//! 다른 레코드를 막지 않습니다.

mod cache;
mod decoder_name;
mod source;

pub use cache::{SchemaCache, SchemaCacheEntry};
pub use decoder_name::{FILE_NAME_PREFIX, derive_decoder_name};
pub use source::{COMPLETED_SUFFIX, FileSchemaSource, SchemaSource};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use apache_avro::Schema;
use logship_core::config::FingerprintMatch;
use logship_core::event::Event;
use logship_core::metrics as m;
use tracing::{debug, warn};

use crate::config::ConfigStore;
use crate::error::SerializerError;

/// 원본 파일 읽기 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 총 시도 횟수 (최소 1)
    pub max_attempts: u32,
    /// 시도 사이 대기 시간
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}

/// 해석된 스키마
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: Arc<Schema>,
    /// 지문으로 해석된 경우의 지문
    pub fingerprint: Option<String>,
    /// 원본 파일 이름에서 추출한 디코더 이름
    pub decoder_name: Option<String>,
}

/// 이벤트의 스키마를 해석하는 서비스
pub struct SchemaResolver<S: SchemaSource = FileSchemaSource> {
    source: Arc<S>,
    cache: SchemaCache,
    retry: RetryPolicy,
    fingerprint_match: FingerprintMatch,
}

impl SchemaResolver<FileSchemaSource> {
    /// 파일 시스템 원본으로 리졸버를 생성합니다.
    pub fn new(config: &ConfigStore) -> Self {
        Self::with_source(FileSchemaSource, config)
    }
}

impl<S: SchemaSource> SchemaResolver<S> {
    /// 지정한 원본으로 리졸버를 생성합니다.
    pub fn with_source(source: S, config: &ConfigStore) -> Self {
        Self {
            source: Arc::new(source),
            cache: SchemaCache::new(config.cache_capacity()),
            retry: RetryPolicy {
                max_attempts: config.retry_attempts().max(1),
                interval: config.retry_interval(),
            },
            fingerprint_match: config.fingerprint_match(),
        }
    }

    /// 재시도 정책을 교체합니다.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            interval: retry.interval,
        };
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// 이벤트의 스키마를 해석합니다.
    pub async fn resolve(&self, event: &Event) -> Result<ResolvedSchema, SerializerError> {
        let decoder_name = event.file().and_then(derive_decoder_name);

        if let Some(literal) = event.schema_literal() {
            return match Schema::parse_str(literal) {
                Ok(schema) => Ok(ResolvedSchema {
                    schema: Arc::new(schema),
                    fingerprint: None,
                    decoder_name,
                }),
                Err(e) => {
                    metrics::counter!(m::SCHEMA_UNAVAILABLE_TOTAL, m::LABEL_SCHEMA_ORIGIN => "literal")
                        .increment(1);
                    Err(SerializerError::SchemaUnavailable {
                        reference: "inline literal".to_owned(),
                        attempts: 1,
                        reason: e.to_string(),
                    })
                }
            };
        }

        let Some(fingerprint) = event.schema_hash() else {
            metrics::counter!(m::SCHEMA_UNAVAILABLE_TOTAL, m::LABEL_SCHEMA_ORIGIN => "none")
                .increment(1);
            return Err(SerializerError::SchemaUnavailable {
                reference: "event headers".to_owned(),
                attempts: 0,
                reason: "no schema literal or fingerprint header".to_owned(),
            });
        };

        if self.fingerprint_match == FingerprintMatch::Value {
            if let Some(entry) = self.cache.get(fingerprint) {
                metrics::counter!(m::SCHEMA_CACHE_HITS_TOTAL).increment(1);
                return Ok(ResolvedSchema {
                    schema: Arc::clone(&entry.schema),
                    fingerprint: Some(entry.fingerprint.clone()),
                    decoder_name: decoder_name.or_else(|| entry.source_name.clone()),
                });
            }
        }

        let Some(file) = event.file() else {
            metrics::counter!(m::SCHEMA_UNAVAILABLE_TOTAL, m::LABEL_SCHEMA_ORIGIN => "file")
                .increment(1);
            return Err(SerializerError::SchemaUnavailable {
                reference: fingerprint.to_owned(),
                attempts: 0,
                reason: "fingerprint header without file header".to_owned(),
            });
        };

        let schema = self.read_with_retry(file).await?;
        let entry = Arc::new(SchemaCacheEntry {
            fingerprint: fingerprint.to_owned(),
            schema,
            source_name: decoder_name.clone(),
        });
        self.cache.insert(Arc::clone(&entry));
        debug!(
            fingerprint,
            decoder = decoder_name.as_deref().unwrap_or("-"),
            "schema loaded from container file"
        );

        Ok(ResolvedSchema {
            schema: Arc::clone(&entry.schema),
            fingerprint: Some(entry.fingerprint.clone()),
            decoder_name,
        })
    }

    async fn read_with_retry(&self, file: &str) -> Result<Arc<Schema>, SerializerError> {
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            metrics::counter!(m::SCHEMA_FILE_READS_TOTAL).increment(1);

            let source = Arc::clone(&self.source);
            let path = PathBuf::from(file);
            let result = tokio::task::spawn_blocking(move || source.read_schema(&path))
                .await
                .unwrap_or_else(|e| {
                    Err(SerializerError::SchemaRead {
                        path: file.to_owned(),
                        reason: format!("schema read task failed: {e}"),
                    })
                });

            match result {
                Ok(schema) => return Ok(Arc::new(schema)),
                Err(e) => {
                    debug!(file, attempt, error = %e, "schema read failed");
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.interval).await;
            }
        }

        warn!(
            file,
            attempts = self.retry.max_attempts,
            error = %last_error,
            "giving up on schema file"
        );
        metrics::counter!(m::SCHEMA_UNAVAILABLE_TOTAL, m::LABEL_SCHEMA_ORIGIN => "file")
            .increment(1);
        Err(SerializerError::SchemaUnavailable {
            reference: file.to_owned(),
            attempts: self.retry.max_attempts,
            reason: last_error,
        })
    }
}
