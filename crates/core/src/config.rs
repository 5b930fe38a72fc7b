//! 설정 관리 -- logship.toml 파싱 및 런타임 설정
//!
//! [`LogshipConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSHIP_SERIALIZER_KIBANA_VERSION=4` 형식)
//! 3. 설정 파일 (`logship.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logship_core::error::LogshipError> {
//! use logship_core::config::LogshipConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogshipConfig::load("logship.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogshipConfig::parse("[serializer]\nkibana_version = 4")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogshipError};

/// 모든 디코더에 적용되는 와일드카드 디코더 이름
pub const WILDCARD: &str = "*";

const MAX_SCHEMA_RETRY_ATTEMPTS: u32 = 100;
const MAX_SCHEMA_CACHE_CAPACITY: usize = 1024;

/// logship 통합 설정
///
/// `logship.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogshipConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 직렬화기 / 필터 정책 설정
    #[serde(default)]
    pub serializer: SerializerConfig,
}

impl LogshipConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogshipError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogshipError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogshipError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogshipError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogshipError> {
        toml::from_str(toml_str).map_err(|e| {
            LogshipError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSHIP_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSHIP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSHIP_GENERAL_LOG_FORMAT");

        // Serializer
        override_bool(
            &mut self.serializer.ignore_private_addresses,
            "LOGSHIP_SERIALIZER_IGNORE_PRIVATE_ADDRESSES",
        );
        override_u32(
            &mut self.serializer.kibana_version,
            "LOGSHIP_SERIALIZER_KIBANA_VERSION",
        );
        override_string(
            &mut self.serializer.country_map_path,
            "LOGSHIP_SERIALIZER_COUNTRY_MAP_PATH",
        );
        override_u32(
            &mut self.serializer.schema_retry_attempts,
            "LOGSHIP_SERIALIZER_SCHEMA_RETRY_ATTEMPTS",
        );
        override_u64(
            &mut self.serializer.schema_retry_interval_ms,
            "LOGSHIP_SERIALIZER_SCHEMA_RETRY_INTERVAL_MS",
        );
        override_usize(
            &mut self.serializer.schema_cache_capacity,
            "LOGSHIP_SERIALIZER_SCHEMA_CACHE_CAPACITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.serializer.validate()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 스키마 지문 비교 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintMatch {
    /// 지문 문자열 값이 같으면 캐시된 스키마를 재사용 (기본값)
    #[default]
    Value,
    /// 지문이 같아도 항상 원본 파일을 다시 읽음 (레거시 호환)
    AlwaysReload,
}

/// 디코더별 필드 포함/제외 규칙 블록
///
/// 한 블록이 여러 디코더에 동시에 적용될 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// 적용 대상 디코더 이름 목록 (`"*"`는 명시되지 않은 모든 디코더)
    pub decoders: Vec<String>,
    /// 필드 이름 목록
    #[serde(default)]
    pub fields: Vec<String>,
    /// 모든 필드 포함 여부 (include 블록에서만 의미가 있음)
    #[serde(default)]
    pub include_all_fields: bool,
}

/// 직렬화기 / 사설 주소 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// 사설(RFC 1918) 주소를 가진 이벤트를 드롭할지 여부
    pub ignore_private_addresses: bool,
    /// 출력 형식 버전 (Kibana 버전). 3 이하는 `[lon, lat]`, 초과는 `{lat, lon}`
    pub kibana_version: u32,
    /// 국가 매핑 CSV 경로 (`이름;Kibana이름`)
    pub country_map_path: String,
    /// 스키마 파일 읽기 최대 시도 횟수
    pub schema_retry_attempts: u32,
    /// 스키마 파일 재시도 간격 (밀리초)
    pub schema_retry_interval_ms: u64,
    /// 지문별 스키마 캐시 용량 (1 = 단일 슬롯)
    pub schema_cache_capacity: usize,
    /// 지문 비교 방식
    pub fingerprint_match: FingerprintMatch,
    /// 필드별 최대 문자 수
    pub truncate: BTreeMap<String, usize>,
    /// 장비 유형별 시간 보정 (시간 단위, 부호 있음)
    pub time_correction: BTreeMap<String, i64>,
    /// 제외 규칙
    pub exclude: Vec<FieldRule>,
    /// 포함 규칙
    pub include: Vec<FieldRule>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            ignore_private_addresses: false,
            kibana_version: 3,
            country_map_path: "/opt/flume/conf/CountryMapping.csv".to_owned(),
            schema_retry_attempts: 10,
            schema_retry_interval_ms: 100,
            schema_cache_capacity: 1,
            fingerprint_match: FingerprintMatch::Value,
            truncate: BTreeMap::new(),
            time_correction: BTreeMap::new(),
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }
}

impl SerializerConfig {
    /// 직렬화기 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        if self.kibana_version == 0 {
            return Err(ConfigError::InvalidValue {
                field: "serializer.kibana_version".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.schema_retry_attempts == 0
            || self.schema_retry_attempts > MAX_SCHEMA_RETRY_ATTEMPTS
        {
            return Err(ConfigError::InvalidValue {
                field: "serializer.schema_retry_attempts".to_owned(),
                reason: format!("must be 1-{MAX_SCHEMA_RETRY_ATTEMPTS}"),
            }
            .into());
        }

        if self.schema_cache_capacity == 0
            || self.schema_cache_capacity > MAX_SCHEMA_CACHE_CAPACITY
        {
            return Err(ConfigError::InvalidValue {
                field: "serializer.schema_cache_capacity".to_owned(),
                reason: format!("must be 1-{MAX_SCHEMA_CACHE_CAPACITY}"),
            }
            .into());
        }

        for (section, rules) in [("exclude", &self.exclude), ("include", &self.include)] {
            for rule in rules {
                if rule.decoders.iter().all(|d| d.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("serializer.{section}.decoders"),
                        reason: "rule must name at least one decoder".to_owned(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
