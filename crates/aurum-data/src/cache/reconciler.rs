//! 갭 조정 캔들 제공자.
//!
//! 요청 구간과 저장소 커버리지를 비교하여 누락 구간(갭)만 업스트림에서
//! 가져온 뒤, 저장소를 다시 읽어 완성된 시퀀스를 반환합니다.
//!
//! # 동작 흐름
//!
//! ```text
//! 요청 (symbol, timeframe, start?, end?, limit)
//!         │
//!         ▼
//! ┌────────────────────┐
//! │ 1. 저장소 범위 조회  │
//! └─────────┬──────────┘
//!           │
//!     ┌─────┴──────┐
//!     │ 갭 있는가?  │──NO──▶ 히트 기록, 저장소 데이터 반환
//!     └─────┬──────┘
//!       YES │ (미스 또는 부분 히트 기록)
//!           ▼
//! ┌────────────────────────────┐
//! │ 2. fetch 락 획득            │ ← 인스턴스당 하나, 심볼별 아님
//! │    락 안에서 갭 재계산       │ ← 동시 요청 중복 호출 방지
//! │ 3. 갭마다 업스트림 호출      │ ← RateLimiter 간격 준수
//! │ 4. conflict-skip 일괄 저장  │
//! └─────────┬──────────────────┘
//!           ▼
//! ┌────────────────────┐
//! │ 5. 저장소 재조회     │
//! └─────────┬──────────┘
//!           ▼
//!   시간순 정렬된 완성 시퀀스 반환
//! ```
//!
//! 경계의 갭은 의도적으로 저장소 끝 캔들과 한 칸 겹치게 계산됩니다.
//! conflict-skip 삽입이 겹침을 중복 없이 흡수합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use aurum_core::{Candle, CandleProvider, ProviderError, Timeframe};

use crate::error::Result;
use crate::metrics::CacheMetrics;
use crate::storage::CandleRepository;

// =============================================================================
// 설정 / 갭 타입
// =============================================================================

/// 갭 조정 정책 설정.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// 내부 갭 판정 임계 배수.
    ///
    /// 이웃 캔들 간격이 `공칭 간격 × gap_multiplier`를 초과하면
    /// 실제 데이터 구멍으로 보고 다시 가져옵니다. 기본값 3은
    /// 주말(일봉 기준 2칸)을 허용하되 그보다 긴 결손은 채우는 값입니다.
    /// 비거래일이 잦은 일봉/주봉에서는 더 크게 설정할 수 있습니다.
    pub gap_multiplier: i32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { gap_multiplier: 3 }
    }
}

/// 확인되지 않은 데이터 구간.
///
/// `start`가 None이면 "알려진 데이터보다 과거로 확장",
/// `end`가 None이면 "현재까지 확장"을 뜻합니다.
/// resolve 호출 동안만 존재하며 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

// =============================================================================
// CachedCandleProvider
// =============================================================================

/// 갭 조정 캔들 제공자.
///
/// 저장소([`CandleRepository`])를 1차 소스로 사용하고, 누락 구간만
/// 업스트림([`CandleProvider`])에서 보충합니다. 업스트림 fetch-and-store
/// 구간은 인스턴스당 하나의 Mutex로 직렬화됩니다.
pub struct CachedCandleProvider {
    store: Arc<dyn CandleRepository>,
    provider: Arc<dyn CandleProvider>,
    metrics: Arc<CacheMetrics>,
    config: ReconcilerConfig,
    /// 업스트림 fetch 직렬화 락.
    ///
    /// 심볼별이 아니라 인스턴스당 하나입니다. 서로 다른 심볼의 요청도
    /// fetch 구간에서는 순서를 기다리지만, 전역 요청 한도를 하나의
    /// RateLimiter로 지키기 위한 단순화입니다. 읽기 전용 조회는
    /// 락을 잡지 않습니다 (저장된 행은 불변, 삽입은 conflict-free).
    fetch_lock: Mutex<()>,
}

impl CachedCandleProvider {
    /// 새 제공자 생성.
    pub fn new(
        store: Arc<dyn CandleRepository>,
        provider: Arc<dyn CandleProvider>,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            store,
            provider,
            metrics,
            config: ReconcilerConfig::default(),
            fetch_lock: Mutex::new(()),
        }
    }

    /// 갭 정책 설정.
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// 캐시 카운터 참조.
    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    /// 캔들 데이터 조회 (갭 자동 보충).
    ///
    /// 반환 시퀀스는 시간 오름차순이며 (symbol, timeframe, open_time)
    /// 기준 중복이 없습니다. 경계는 양끝 포함입니다.
    ///
    /// # 부분 실패
    ///
    /// 일부 갭의 업스트림 조회가 실패해도 저장소에서 반환할 수 있는
    /// 캔들이 있으면 그대로 반환합니다. 실패가 호출자에게 전파되는
    /// 경우는 최종 재조회 결과가 비어 있을 때뿐입니다.
    #[instrument(skip(self), fields(provider = self.provider.provider_name()))]
    pub async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let cached = self
            .store
            .find_range(symbol, timeframe, start, end)
            .await?;
        let gaps = self.detect_gaps(&cached, start, end, limit, timeframe);

        // 히트/미스 분류는 락 이전의 조회 기준
        if cached.is_empty() {
            self.metrics.record_miss();
        } else if gaps.is_empty() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_partial_hit();
        }

        debug!(
            symbol = symbol,
            timeframe = %timeframe,
            cached = cached.len(),
            gaps = gaps.len(),
            "커버리지 확인"
        );

        let mut fetch_error: Option<ProviderError> = None;

        if !gaps.is_empty() {
            let _guard = self.fetch_lock.lock().await;

            // 락을 기다리는 동안 다른 호출자가 같은 구간을 채웠을 수 있으므로
            // 저장소를 다시 읽어 갭을 재계산한다. 두 동시 요청이 같은 빈
            // 구간을 요청해도 업스트림 호출은 한 번만 나간다.
            let current = self
                .store
                .find_range(symbol, timeframe, start, end)
                .await?;
            let remaining = self.detect_gaps(&current, start, end, limit, timeframe);

            for gap in &remaining {
                self.metrics.record_api_call();

                match self
                    .provider
                    .fetch_candles(symbol, timeframe, gap.start, gap.end, limit)
                    .await
                {
                    Ok(candles) if !candles.is_empty() => {
                        let inserted = self
                            .store
                            .insert_ignore_conflicts(symbol, timeframe, &candles)
                            .await?;
                        debug!(
                            symbol = symbol,
                            gap_start = ?gap.start,
                            gap_end = ?gap.end,
                            fetched = candles.len(),
                            inserted = inserted,
                            "갭 보충 완료"
                        );
                    }
                    Ok(_) => {
                        debug!(
                            symbol = symbol,
                            gap_start = ?gap.start,
                            gap_end = ?gap.end,
                            "업스트림 응답 없음 (비거래 구간일 수 있음)"
                        );
                    }
                    Err(e) => {
                        // 갭 하나의 실패로 전체 요청을 버리지 않는다.
                        warn!(
                            symbol = symbol,
                            gap_start = ?gap.start,
                            gap_end = ?gap.end,
                            error = %e,
                            "갭 보충 실패"
                        );
                        fetch_error = Some(e);
                    }
                }
            }
        }

        // 최종 재조회: 저장소가 유일한 진실 공급원
        let mut result = self
            .store
            .find_range(symbol, timeframe, start, end)
            .await?;

        // 경계 없는 요청은 최신 limit개로 절단
        if start.is_none() && end.is_none() && result.len() > limit {
            let skip = result.len() - limit;
            result.drain(..skip);
        }

        if result.is_empty() {
            if let Some(e) = fetch_error {
                return Err(e.into());
            }
        }

        debug!(
            symbol = symbol,
            timeframe = %timeframe,
            returned = result.len(),
            "캔들 반환"
        );

        Ok(result)
    }

    /// 저장소 커버리지와 요청 구간을 비교하여 갭 목록 계산.
    ///
    /// 반환 순서: 선행 갭 → 내부 갭 → 후행 갭 → (경계 없음 시) 개수 보충 갭.
    fn detect_gaps(
        &self,
        cached: &[Candle],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
        timeframe: Timeframe,
    ) -> Vec<CoverageGap> {
        // 저장 데이터가 전혀 없으면 요청 구간 전체가 하나의 갭
        if cached.is_empty() {
            return if start.is_none() && end.is_none() {
                // 경계 없는 요청: 과거 방향 무제한 갭 하나
                vec![CoverageGap {
                    start: None,
                    end: None,
                }]
            } else {
                vec![CoverageGap { start, end }]
            };
        }

        let mut gaps = Vec::new();
        let earliest = cached[0].open_time;
        let latest = cached[cached.len() - 1].open_time;

        // 선행 갭: 저장 데이터보다 앞선 요청 구간
        if let Some(start) = start {
            if earliest > start {
                gaps.push(CoverageGap {
                    start: Some(start),
                    end: Some(earliest),
                });
            }
        }

        // 내부 갭: 이웃 간격이 임계(공칭 간격 × 배수)를 초과하는 구멍.
        // 임계 이하의 결손(주말/공휴일)은 허용하고 다시 가져오지 않는다.
        let threshold = timeframe.duration() * self.config.gap_multiplier;
        for pair in cached.windows(2) {
            if pair[1].open_time - pair[0].open_time > threshold {
                gaps.push(CoverageGap {
                    start: Some(pair[0].open_time),
                    end: Some(pair[1].open_time),
                });
            }
        }

        // 후행 갭: 저장 데이터 이후의 요청 구간
        if let Some(end) = end {
            if latest < end {
                gaps.push(CoverageGap {
                    start: Some(latest),
                    end: Some(end),
                });
            }
        }

        // 경계 없는 요청인데 개수가 모자라면 현재까지 보충
        if start.is_none() && end.is_none() && cached.len() < limit {
            gaps.push(CoverageGap {
                start: Some(latest),
                end: None,
            });
        }

        gaps
    }
}

// =============================================================================
// 테스트
// =============================================================================
