//! 캐시 성능 카운터.
//!
//! 프로세스당 한 번 생성되어 `Arc`로 주입되는 명시적 소유 컴포넌트입니다.
//! 모듈 전역 상태가 아니므로 테스트마다 격리된 인스턴스를 만들 수 있습니다.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 캐시 성능 카운터.
///
/// - **hit**: 요청 구간이 저장소만으로 완전히 충족됨
/// - **partial hit**: 일부 구간만 저장소에 있어 갭 fetch가 필요했음
/// - **miss**: 요청 구간에 해당하는 저장 데이터가 전혀 없었음
/// - **api_calls**: 실제로 수행한 업스트림 호출 수 (갭당 1회)
#[derive(Debug, Default)]
pub struct CacheMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    partial_cache_hits: AtomicU64,
    api_calls: AtomicU64,
}

impl CacheMetrics {
    /// 새 카운터 생성 (모든 값 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// 완전 히트 기록.
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// 미스 기록.
    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// 부분 히트 기록.
    pub fn record_partial_hit(&self) {
        self.partial_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// 업스트림 호출 기록.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// 현재 시점 스냅샷 생성.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let partial_cache_hits = self.partial_cache_hits.load(Ordering::Relaxed);
        let api_calls = self.api_calls.load(Ordering::Relaxed);
        let total_requests = cache_hits + cache_misses + partial_cache_hits;

        let rate = |count: u64| -> f64 {
            if total_requests == 0 {
                0.0
            } else {
                round2(count as f64 / total_requests as f64 * 100.0)
            }
        };

        CacheMetricsSnapshot {
            cache_hits,
            cache_misses,
            partial_cache_hits,
            api_calls,
            total_requests,
            hit_rate_pct: rate(cache_hits),
            partial_hit_rate_pct: rate(partial_cache_hits),
        }
    }
}

/// 소수점 둘째 자리 반올림.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 캐시 카운터 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheMetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub partial_cache_hits: u64,
    pub api_calls: u64,
    pub total_requests: u64,
    pub hit_rate_pct: f64,
    pub partial_hit_rate_pct: f64,
}
