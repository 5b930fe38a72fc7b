//! 원본 컨테이너 파일 이름에서 디코더 이름을 추출합니다.
//!
//! 파일 이름 형식:
//! `sessions-warehouseconnector-<source>-<role>-<seq>-<epochms>-TS<suffix>`
//!
//! `<source>` 자체에 하이픈이 들어갈 수 있으므로, 앞쪽 접두어 뒤부터
//! `-TS` 표식에서 거꾸로 세어 세 번째 하이픈 앞까지를 디코더 이름으로 봅니다.

/// 파일 이름 고정 접두어
pub const FILE_NAME_PREFIX: &str = "sessions-warehouseconnector-";

/// 타임스탬프 구간 표식
const TIMESTAMP_MARKER: &str = "-TS";

/// 파일 경로에서 디코더 이름을 추출합니다.
///
/// 접두어나 표식이 없거나 결과가 비어 있으면 `None`을 반환합니다.
///
/// ```
/// use logship_serializer::schema::derive_decoder_name;
///
/// let name = derive_decoder_name(
///     "/data/sessions-warehouseconnector-eb-rng-aptdec1-es-34835-1425401857360-TS2015-3-3-14-23TE.avro",
/// );
/// assert_eq!(name.as_deref(), Some("eb-rng-aptdec1"));
/// ```
pub fn derive_decoder_name(file: &str) -> Option<String> {
    let start = file.find(FILE_NAME_PREFIX)? + FILE_NAME_PREFIX.len();
    let marker = file.rfind(TIMESTAMP_MARKER)?;
    if marker <= start {
        return None;
    }

    // epochms, seq, role 앞의 하이픈을 차례로 찾음
    let mut end = marker;
    for _ in 0..3 {
        end = file[..end].rfind('-')?;
    }
    if end <= start {
        return None;
    }

    Some(file[start..end].to_owned())
}
