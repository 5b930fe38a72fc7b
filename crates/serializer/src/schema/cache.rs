//! 지문별 스키마 캐시
//!
//! 용량 제한이 있는 MRU 캐시로, 가장 최근에 적재되거나 조회된 항목이 앞에 옵니다.
//! 용량을 넘으면 가장 오래 사용되지 않은 항목부터 밀려납니다.
//! 기본 용량 1은 단일 슬롯(불일치 시 교체)과 동일하게 동작합니다.
//!
//! 항목은 `Arc`로 통째로 교체되므로 읽는 쪽이 절반만 갱신된 항목을 볼 수 없습니다.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use apache_avro::Schema;

/// 캐시 항목: 지문, 스키마, 디코더 이름
#[derive(Debug)]
pub struct SchemaCacheEntry {
    /// 스키마 지문 (헤더 값 그대로)
    pub fingerprint: String,
    /// 해석된 스키마
    pub schema: Arc<Schema>,
    /// 원본 파일 이름에서 추출한 디코더 이름
    pub source_name: Option<String>,
}

/// 용량 제한 스키마 캐시
#[derive(Debug)]
pub struct SchemaCache {
    capacity: usize,
    entries: RwLock<VecDeque<Arc<SchemaCacheEntry>>>,
}

impl SchemaCache {
    /// 주어진 용량으로 캐시를 생성합니다. 0은 1로 올립니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 지문이 일치하는 항목을 찾아 맨 앞으로 옮깁니다.
    pub fn get(&self, fingerprint: &str) -> Option<Arc<SchemaCacheEntry>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let position = entries
            .iter()
            .position(|entry| entry.fingerprint == fingerprint)?;
        let entry = entries.remove(position)?;
        entries.push_front(Arc::clone(&entry));
        Some(entry)
    }

    /// 항목을 맨 앞에 넣고, 같은 지문의 이전 항목과 용량 초과분을 제거합니다.
    pub fn insert(&self, entry: Arc<SchemaCacheEntry>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|existing| existing.fingerprint != entry.fingerprint);
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 가장 최근에 사용된 항목
    pub fn latest(&self) -> Option<Arc<SchemaCacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .front()
            .cloned()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(1)
    }
}
