//! 스키마 원본 -- Avro 오브젝트 컨테이너 헤더에서 스키마를 읽습니다.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use apache_avro::{Reader, Schema};
use tracing::debug;

use crate::error::SerializerError;

/// 업스트림 작성기가 처리를 끝낸 파일에 붙이는 접미어
pub const COMPLETED_SUFFIX: &str = ".COMPLETED";

/// 지문으로 참조된 스키마를 읽어오는 원본
///
/// 구현은 블로킹 I/O를 수행할 수 있으며, 리졸버가 블로킹 스레드에서 호출합니다.
pub trait SchemaSource: Send + Sync + 'static {
    /// 경로가 가리키는 스키마를 한 번 읽습니다. 재시도는 호출자가 담당합니다.
    fn read_schema(&self, path: &Path) -> Result<Schema, SerializerError>;
}

/// 로컬 파일 시스템의 Avro 컨테이너 파일을 읽는 원본
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSchemaSource;

impl FileSchemaSource {
    /// 실제로 열어야 할 경로를 고릅니다.
    ///
    /// 원래 경로가 없으면 업스트림이 이미 `.COMPLETED`로 이름을 바꿨다고 봅니다.
    pub fn effective_path(path: &Path) -> PathBuf {
        if path.exists() {
            return path.to_path_buf();
        }
        let mut renamed = path.as_os_str().to_owned();
        renamed.push(COMPLETED_SUFFIX);
        PathBuf::from(renamed)
    }
}

impl SchemaSource for FileSchemaSource {
    fn read_schema(&self, path: &Path) -> Result<Schema, SerializerError> {
        let path = Self::effective_path(path);
        debug!(path = %path.display(), "reading schema from container header");

        let read_error = |reason: String| SerializerError::SchemaRead {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(&path).map_err(|e| read_error(e.to_string()))?;
        let reader = Reader::new(BufReader::new(file)).map_err(|e| read_error(e.to_string()))?;
        Ok(reader.writer_schema().clone())
    }
}
