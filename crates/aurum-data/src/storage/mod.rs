//! 캔들 저장소.
//!
//! (symbol, timeframe, open_time) 키로 캔들을 저장하고
//! 시간순 범위 조회를 제공합니다.

mod candles;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use aurum_core::{Candle, Timeframe};

use crate::error::Result;

pub use candles::{CandleStore, CoverageRecord};
pub use memory::MemoryCandleStore;

/// 캔들 저장소 추상화.
///
/// 캐시 계층이 의존하는 최소 표면입니다: 범위 조회와 conflict-skip 삽입.
/// 운영에서는 PostgreSQL 기반 [`CandleStore`], 테스트에서는
/// [`MemoryCandleStore`]를 사용합니다.
///
/// # 계약
///
/// - `find_range`는 항상 `open_time` 오름차순으로 반환하며,
///   주어진 경계는 양끝 모두 포함(inclusive)입니다.
/// - `insert_ignore_conflicts`는 동일 키 행이 이미 존재하면 건너뛰고
///   실제로 삽입된 행 수를 반환합니다. 저장된 캔들은 불변입니다.
#[async_trait]
pub trait CandleRepository: Send + Sync {
    /// 구간 내 캔들 조회 (시간 오름차순, 경계 포함).
    async fn find_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>>;

    /// 캔들 일괄 삽입 (중복 키는 건너뜀).
    async fn insert_ignore_conflicts(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize>;
}
