//! 정책 저장소 -- 로드 후 변경되지 않는 필드 정책 테이블
//!
//! [`ConfigStore`]는 [`SerializerConfig`]에서 한 번 만들어진 뒤
//! `Arc`로 공유되어 읽기 전용으로 사용됩니다.
//!
//! # 조회 규칙
//! 포함/제외 필드 집합은 동일한 규칙으로 찾습니다:
//! 1. 디코더 이름이 정확히 일치하는 항목
//! 2. 와일드카드 `*` 항목
//! 3. 빈 집합

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use logship_core::config::{FieldRule, FingerprintMatch, LogshipConfig, SerializerConfig, WILDCARD};
use tracing::{debug, error, info, warn};

use crate::error::SerializerError;

/// 국가 매핑 CSV 구분자
const COUNTRY_MAP_SEPARATOR: char = ';';

/// 로드 후 불변인 직렬화 정책 저장소
#[derive(Debug, Clone)]
pub struct ConfigStore {
    excluded: HashMap<String, HashSet<String>>,
    included: HashMap<String, HashSet<String>>,
    truncate: BTreeMap<String, usize>,
    time_correction: BTreeMap<String, i64>,
    ignore_private_addresses: bool,
    output_format_version: u32,
    country_map: HashMap<String, String>,
    retry_attempts: u32,
    retry_interval: Duration,
    cache_capacity: usize,
    fingerprint_match: FingerprintMatch,
    empty: HashSet<String>,
}

impl Default for ConfigStore {
    /// 보수적 기본값: 잘라내기 없음, 제외/포함 없음, 필터 비활성, 출력 버전 3
    fn default() -> Self {
        Self::from_config(&SerializerConfig::default())
    }
}

impl ConfigStore {
    /// 직렬화기 설정 섹션에서 정책 저장소를 구성합니다.
    ///
    /// 같은 디코더를 다시 지정한 규칙 블록은 앞선 블록을 대체합니다.
    pub fn from_config(config: &SerializerConfig) -> Self {
        Self {
            excluded: build_rule_table(&config.exclude, false),
            included: build_rule_table(&config.include, true),
            truncate: config.truncate.clone(),
            time_correction: config.time_correction.clone(),
            ignore_private_addresses: config.ignore_private_addresses,
            output_format_version: config.kibana_version,
            country_map: HashMap::new(),
            retry_attempts: config.schema_retry_attempts,
            retry_interval: Duration::from_millis(config.schema_retry_interval_ms),
            cache_capacity: config.schema_cache_capacity,
            fingerprint_match: config.fingerprint_match,
            empty: HashSet::new(),
        }
    }

    /// 설정 파일을 로드합니다. 실패하면 에러를 기록하고 기본값으로 대체합니다.
    ///
    /// 국가 매핑 CSV도 함께 로드합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let config = match LogshipConfig::load(path).await {
            Ok(config) => config.serializer,
            Err(e) => {
                let err = SerializerError::ConfigLoad {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                };
                error!(error = %err, "failed to read serializer config, using defaults");
                SerializerConfig::default()
            }
        };

        let mut store = Self::from_config(&config);
        store.load_country_map(&config.country_map_path).await;
        store
    }

    /// `이름;Kibana이름` 형식의 국가 매핑 파일을 읽습니다.
    ///
    /// 파일이 없으면 조용히 넘어가고, 형식이 잘못된 줄은 경고 후 건너뜁니다.
    /// 반환값은 매핑된 국가 수입니다.
    pub async fn load_country_map(&mut self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "country mapping file not present");
                return 0;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read country mapping file");
                return 0;
            }
        };

        info!(path = %path.display(), "reading country mapping file");
        let mut mapped = 0;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once(COUNTRY_MAP_SEPARATOR) {
                Some((name, kibana)) => {
                    let kibana = kibana
                        .split(COUNTRY_MAP_SEPARATOR)
                        .next()
                        .unwrap_or(kibana);
                    self.country_map.insert(name.to_owned(), kibana.to_owned());
                    mapped += 1;
                }
                None => warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    "skipping malformed country mapping line"
                ),
            }
        }
        info!(count = mapped, "found mapped countries");
        mapped
    }

    /// 디코더에 대해 제외할 필드 집합
    pub fn excluded_fields(&self, source: &str) -> &HashSet<String> {
        lookup(&self.excluded, source).unwrap_or(&self.empty)
    }

    /// 디코더에 대해 포함할 필드 집합 (`*` 포함 가능)
    pub fn included_fields(&self, source: &str) -> &HashSet<String> {
        lookup(&self.included, source).unwrap_or(&self.empty)
    }

    /// 필드의 최대 문자 수
    pub fn truncation_length(&self, field: &str) -> Option<usize> {
        self.truncate.get(field).copied()
    }

    /// 장비 유형의 시간 보정값 (시간 단위)
    pub fn time_correction(&self, device_type: &str) -> Option<i64> {
        self.time_correction.get(device_type).copied()
    }

    pub fn ignore_private_addresses(&self) -> bool {
        self.ignore_private_addresses
    }

    /// 출력 형식 버전 (Kibana 버전)
    pub fn output_format_version(&self) -> u32 {
        self.output_format_version
    }

    /// 국가 매핑 테이블. 변환 로직에서는 사용하지 않습니다.
    pub fn country_map(&self) -> &HashMap<String, String> {
        &self.country_map
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub fn fingerprint_match(&self) -> FingerprintMatch {
        self.fingerprint_match
    }
}

fn lookup<'a>(
    table: &'a HashMap<String, HashSet<String>>,
    source: &str,
) -> Option<&'a HashSet<String>> {
    table.get(source).or_else(|| table.get(WILDCARD))
}

fn build_rule_table(rules: &[FieldRule], honor_include_all: bool) -> HashMap<String, HashSet<String>> {
    let mut table = HashMap::new();
    for rule in rules {
        let fields: HashSet<String> = if honor_include_all && rule.include_all_fields {
            HashSet::from([WILDCARD.to_owned()])
        } else {
            rule.fields.iter().cloned().collect()
        };
        for decoder in rule.decoders.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            table.insert(decoder.to_owned(), fields.clone());
        }
    }
    table
}
