//! 사설 주소 필터 -- RFC 1918 / site-local 주소를 가진 이벤트를 걸러냅니다.
//!
//! 필터가 켜져 있을 때만 동작하며, 판단할 수 없는 경우(스키마 없음, 디코딩 실패,
//! 출발지 주소 없음, 주소 파싱 실패)에는 이벤트를 통과시킵니다.
//! 목적지 주소만 없는 경우에는 출발지 주소만으로 판단합니다.
//!
//! 스키마를 확보하지 못한 이벤트는 여기서 버리지 않고 직렬화기로 넘깁니다.
//! 직렬화기도 같은 이유로 문서를 만들지 못하므로 `PipelineStats`에서는
//! `filtered`가 아닌 `failed`로 집계됩니다.

use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;

use logship_core::event::Event;
use logship_core::metrics as m;
use logship_core::pipeline::EventInterceptor;
use tracing::debug;

use crate::config::ConfigStore;
use crate::decoder::{DecodedRecord, RecordDecoder};
use crate::schema::{FileSchemaSource, SchemaResolver, SchemaSource};

/// 내부/루프백 캡처를 나타내는 medium 값
pub const MEDIUM_INTERNAL: i64 = 32;

const FIELD_MEDIUM: &str = "medium";
const FIELD_IP_SRC: &str = "ip_src";
const FIELD_IP_DST: &str = "ip_dst";

/// 주소가 사설(RFC 1918) 또는 IPv6 site-local(`fec0::/10`) 대역인지 판단합니다.
pub fn is_site_local(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.is_private(),
            None => is_ipv6_site_local(&v6),
        },
    }
}

fn is_ipv6_site_local(addr: &Ipv6Addr) -> bool {
    addr.segments()[0] & 0xffc0 == 0xfec0
}

fn parse_addr(text: &str) -> Option<IpAddr> {
    text.trim().parse().ok()
}

/// 사설 주소 필터
pub struct PrivacyFilter<S: SchemaSource = FileSchemaSource> {
    config: Arc<ConfigStore>,
    resolver: Arc<SchemaResolver<S>>,
    decoder: RecordDecoder,
}

impl<S: SchemaSource> PrivacyFilter<S> {
    pub fn new(config: Arc<ConfigStore>, resolver: Arc<SchemaResolver<S>>) -> Self {
        Self {
            config,
            resolver,
            decoder: RecordDecoder,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.ignore_private_addresses()
    }

    /// 디코딩된 레코드를 버려야 하는지 판단합니다.
    pub fn should_drop(&self, record: &DecodedRecord) -> bool {
        if !self.enabled() {
            return false;
        }

        let medium = record
            .string(FIELD_MEDIUM)
            .and_then(|m| m.trim().parse::<i64>().ok());
        if medium == Some(MEDIUM_INTERNAL) {
            return false;
        }

        // 출발지 없음: 목적지와 무관하게 통과
        let Some(src) = record.string(FIELD_IP_SRC) else {
            return false;
        };
        let Some(src) = parse_addr(&src) else {
            return false;
        };

        match record.string(FIELD_IP_DST) {
            // 목적지 없음: 루프백으로 간주
            None => is_site_local(src),
            Some(dst) => match parse_addr(&dst) {
                Some(dst) => is_site_local(src) || is_site_local(dst),
                None => false,
            },
        }
    }

    /// 이벤트를 버려야 하는지 판단합니다. 스키마/디코딩 실패는 통과시킵니다.
    pub async fn should_drop_event(&self, event: &Event) -> bool {
        if !self.enabled() {
            return false;
        }

        let resolved = match self.resolver.resolve(event).await {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(event = %event, error = %e, "schema unavailable, keeping event");
                return false;
            }
        };

        match self.decoder.decode(resolved.schema, &event.body) {
            Ok(record) => self.should_drop(&record),
            Err(e) => {
                debug!(event = %event, error = %e, "undecodable event kept");
                false
            }
        }
    }

    /// 배치에서 사설 주소 이벤트를 제거합니다. 남은 이벤트의 순서는 유지됩니다.
    pub async fn filter(&self, events: Vec<Event>) -> Vec<Event> {
        if !self.enabled() {
            return events;
        }

        let total = events.len();
        let mut kept = Vec::with_capacity(total);
        for event in events {
            if !self.should_drop_event(&event).await {
                kept.push(event);
            }
        }

        let removed = total - kept.len();
        metrics::counter!(m::PRIVACY_FILTER_EVENTS_DROPPED_TOTAL).increment(removed as u64);
        metrics::counter!(m::PRIVACY_FILTER_EVENTS_PASSED_TOTAL).increment(kept.len() as u64);
        if removed > 0 {
            debug!(dropped = removed, "dropped events with private addresses");
        }
        kept
    }
}

impl<S: SchemaSource> EventInterceptor for PrivacyFilter<S> {
    fn name(&self) -> &str {
        "privacy-filter"
    }

    async fn intercept_batch(&self, events: Vec<Event>) -> Vec<Event> {
        self.filter(events).await
    }
}
