//! 직렬화기 에러 타입
//!
//! [`SerializerError`]는 스키마 확보, 레코드 디코딩, 설정 로딩 중 발생하는
//! 모든 에러를 표현합니다. 어떤 에러도 프로세스를 종료시키지 않으며,
//! 레코드 또는 배치 단위에서 처리됩니다.
//! `From<SerializerError> for LogshipError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use logship_core::error::{ConfigError, LogshipError, ParseError, PipelineError};

/// 직렬화기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    /// 설정 로딩 실패 (기본값으로 대체됨)
    #[error("config load error: {path}: {reason}")]
    ConfigLoad {
        /// 설정 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 스키마를 확보하지 못함 (인라인 파싱 실패 또는 재시도 소진)
    #[error("schema unavailable: {reference} after {attempts} attempt(s): {reason}")]
    SchemaUnavailable {
        /// 스키마 참조 (파일 경로, 지문 등)
        reference: String,
        /// 시도 횟수
        attempts: u32,
        /// 마지막 실패 사유
        reason: String,
    },

    /// 스키마 컨테이너 헤더 읽기 실패 (단일 시도)
    #[error("schema read error: {path}: {reason}")]
    SchemaRead {
        /// 읽으려던 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 레코드 바이트가 스키마가 요구하는 것보다 짧음
    #[error("incomplete record: {0}")]
    IncompleteRecord(String),

    /// 그 외 구조적 디코딩 실패
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerializerError {
    /// 메트릭 레이블로 쓰는 짧은 분류명
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigLoad { .. } => "config",
            Self::SchemaUnavailable { .. } | Self::SchemaRead { .. } => "schema",
            Self::IncompleteRecord(_) => "incomplete",
            Self::MalformedRecord(_) => "malformed",
            Self::Io(_) => "io",
        }
    }
}

impl From<SerializerError> for LogshipError {
    fn from(err: SerializerError) -> Self {
        match err {
            SerializerError::ConfigLoad { path, reason } => {
                LogshipError::Config(ConfigError::ParseFailed {
                    reason: format!("{path}: {reason}"),
                })
            }
            SerializerError::SchemaUnavailable { .. } | SerializerError::SchemaRead { .. } => {
                LogshipError::Pipeline(PipelineError::SchemaUnavailable(err.to_string()))
            }
            SerializerError::IncompleteRecord(reason) => {
                LogshipError::Parse(ParseError::Incomplete(reason))
            }
            SerializerError::MalformedRecord(reason) => {
                LogshipError::Parse(ParseError::Failed { reason })
            }
            SerializerError::Io(e) => LogshipError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_unavailable_display() {
        let err = SerializerError::SchemaUnavailable {
            reference: "/data/sessions.avro".to_owned(),
            attempts: 10,
            reason: "No such file or directory".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sessions.avro"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn converts_schema_errors_to_pipeline_error() {
        let err = SerializerError::SchemaRead {
            path: "/x.avro".to_owned(),
            reason: "bad magic".to_owned(),
        };
        let converted: LogshipError = err.into();
        assert!(matches!(
            converted,
            LogshipError::Pipeline(PipelineError::SchemaUnavailable(_))
        ));
    }

    #[test]
    fn converts_incomplete_record_to_parse_error() {
        let converted: LogshipError = SerializerError::IncompleteRecord("eof".to_owned()).into();
        assert!(matches!(
            converted,
            LogshipError::Parse(ParseError::Incomplete(_))
        ));
    }

    #[test]
    fn kind_labels() {
        assert_eq!(SerializerError::MalformedRecord(String::new()).kind(), "malformed");
        assert_eq!(SerializerError::IncompleteRecord(String::new()).kind(), "incomplete");
    }
}
