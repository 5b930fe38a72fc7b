//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logship_`
//! - 컴포넌트명: `schema_`, `serializer_`, `privacy_filter_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logship_core::metrics::SERIALIZER_DOCUMENTS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 드롭 사유 레이블 키 (schema, decode)
pub const LABEL_REASON: &str = "reason";

/// 스키마 출처 레이블 키 (literal, file)
pub const LABEL_SCHEMA_ORIGIN: &str = "origin";

// ─── Schema Resolver 메트릭 ────────────────────────────────────────

/// 스키마 캐시 적중 수 (counter)
pub const SCHEMA_CACHE_HITS_TOTAL: &str = "logship_schema_cache_hits_total";

/// 원본 파일에서 스키마를 읽은 횟수 (counter)
pub const SCHEMA_FILE_READS_TOTAL: &str = "logship_schema_file_reads_total";

/// 스키마 확보 실패 수 (counter, label: origin)
pub const SCHEMA_UNAVAILABLE_TOTAL: &str = "logship_schema_unavailable_total";

// ─── Serializer 메트릭 ──────────────────────────────────────────────

/// 생성된 문서 수 (counter)
pub const SERIALIZER_DOCUMENTS_TOTAL: &str = "logship_serializer_documents_total";

/// 문서를 만들지 못하고 드롭된 레코드 수 (counter, label: reason)
pub const SERIALIZER_RECORDS_DROPPED_TOTAL: &str = "logship_serializer_records_dropped_total";

// ─── Privacy Filter 메트릭 ──────────────────────────────────────────

/// 사설 주소로 인해 드롭된 이벤트 수 (counter)
pub const PRIVACY_FILTER_EVENTS_DROPPED_TOTAL: &str =
    "logship_privacy_filter_events_dropped_total";

/// 필터를 통과한 이벤트 수 (counter)
pub const PRIVACY_FILTER_EVENTS_PASSED_TOTAL: &str = "logship_privacy_filter_events_passed_total";

/// 모든 메트릭 이름 목록
pub const ALL_METRIC_NAMES: &[&str] = &[
    SCHEMA_CACHE_HITS_TOTAL,
    SCHEMA_FILE_READS_TOTAL,
    SCHEMA_UNAVAILABLE_TOTAL,
    SERIALIZER_DOCUMENTS_TOTAL,
    SERIALIZER_RECORDS_DROPPED_TOTAL,
    PRIVACY_FILTER_EVENTS_DROPPED_TOTAL,
    PRIVACY_FILTER_EVENTS_PASSED_TOTAL,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        SCHEMA_CACHE_HITS_TOTAL,
        "Events whose schema was served from the fingerprint cache"
    );
    describe_counter!(
        SCHEMA_FILE_READS_TOTAL,
        "Schema header reads against backing container files"
    );
    describe_counter!(
        SCHEMA_UNAVAILABLE_TOTAL,
        "Events dropped because no schema could be resolved"
    );
    describe_counter!(
        SERIALIZER_DOCUMENTS_TOTAL,
        "Documents produced for the search index"
    );
    describe_counter!(
        SERIALIZER_RECORDS_DROPPED_TOTAL,
        "Records dropped without producing a document"
    );
    describe_counter!(
        PRIVACY_FILTER_EVENTS_DROPPED_TOTAL,
        "Events removed because of private-network addresses"
    );
    describe_counter!(
        PRIVACY_FILTER_EVENTS_PASSED_TOTAL,
        "Events kept by the private-address filter"
    );
}
