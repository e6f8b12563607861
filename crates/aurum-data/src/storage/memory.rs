//! 인메모리 캔들 저장소.
//!
//! DB 없이 캐시/엔진을 구동하기 위한 구현입니다. 단위 테스트와
//! 오프라인 실험에서 사용하며, [`CandleStore`](super::CandleStore)와
//! 동일한 계약(시간순 조회, conflict-skip 삽입)을 따릅니다.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use aurum_core::{Candle, Timeframe};

use crate::error::Result;
use crate::storage::CandleRepository;

/// (symbol, timeframe, open_time) 키.
type CandleKey = (String, String, DateTime<Utc>);

/// 인메모리 캔들 저장소.
///
/// BTreeMap 키 정렬이 시간순 조회를 보장합니다.
#[derive(Debug, Default)]
pub struct MemoryCandleStore {
    candles: RwLock<BTreeMap<CandleKey, Candle>>,
}

impl MemoryCandleStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 전체 캔들 수.
    pub async fn len(&self) -> usize {
        self.candles.read().await.len()
    }

    /// 저장소가 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.candles.read().await.is_empty()
    }
}

#[async_trait]
impl CandleRepository for MemoryCandleStore {
    async fn find_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>> {
        let guard = self.candles.read().await;
        let tf_str = timeframe.as_str();

        let result = guard
            .iter()
            .filter(|((s, tf, time), _)| {
                s == symbol
                    && tf == tf_str
                    && start.map_or(true, |b| *time >= b)
                    && end.map_or(true, |b| *time <= b)
            })
            .map(|(_, candle)| candle.clone())
            .collect();

        Ok(result)
    }

    async fn insert_ignore_conflicts(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize> {
        let mut guard = self.candles.write().await;
        let mut inserted = 0;

        for candle in candles {
            let key = (
                symbol.to_string(),
                timeframe.as_str().to_string(),
                candle.open_time,
            );
            // 동일 키 행은 불변: 이미 있으면 건너뜀
            if let std::collections::btree_map::Entry::Vacant(entry) = guard.entry(key) {
                entry.insert(candle.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}
