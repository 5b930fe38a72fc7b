//! 파이프라인 trait -- 직렬화기와 인터셉터 확장 포인트 정의
//!
//! 호스트 파이프라인은 이벤트 배치를 먼저 [`EventInterceptor`]에 통과시킨 뒤,
//! 살아남은 이벤트를 [`EventSerializer`]로 검색 인덱스용 문서로 변환합니다.

use std::future::Future;

use crate::error::LogshipError;
use crate::event::Event;

/// 이벤트를 인덱스 문서로 직렬화하는 trait
///
/// 레코드 단위 실패(스키마 없음, 디코딩 실패)는 `Ok(None)`으로 표현하며,
/// 파이프라인 전체를 중단시키지 않습니다.
pub trait EventSerializer: Send + Sync {
    /// 직렬화기 이름
    fn name(&self) -> &str;

    /// 이벤트 하나를 JSON 문서로 변환합니다. 변환할 수 없는 레코드는 `None`.
    fn serialize(
        &self,
        event: &Event,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, LogshipError>> + Send;
}

/// 이벤트 배치를 걸러내는 trait
///
/// 반환된 배치는 입력 배치에서 일부를 제거한 것이어야 하며,
/// 살아남은 이벤트의 상대 순서를 유지해야 합니다.
pub trait EventInterceptor: Send + Sync {
    /// 인터셉터 이름
    fn name(&self) -> &str;

    /// 배치를 걸러냅니다.
    fn intercept_batch(&self, events: Vec<Event>) -> impl Future<Output = Vec<Event>> + Send;
}
