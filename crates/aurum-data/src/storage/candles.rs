//! PostgreSQL 캔들 저장소.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use aurum_core::{Candle, Timeframe};

use crate::error::{DataError, Result};
use crate::storage::CandleRepository;

/// 캔들 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct CandleRecord {
    pub symbol: String,
    pub timeframe: String,
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl CandleRecord {
    /// 도메인 객체로 변환.
    pub fn to_candle(&self) -> Candle {
        let timeframe = self.timeframe.parse().unwrap_or(Timeframe::D1);
        Candle {
            symbol: self.symbol.clone(),
            timeframe,
            open_time: self.open_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// (symbol, timeframe) 별 커버리지 요약.
#[derive(Debug, Clone, FromRow)]
pub struct CoverageRecord {
    pub symbol: String,
    pub timeframe: String,
    pub first_time: Option<DateTime<Utc>>,
    pub last_time: Option<DateTime<Utc>>,
    pub candle_count: i64,
}

/// PostgreSQL 캔들 저장소.
///
/// `candles` 테이블에 (symbol, timeframe, open_time) 복합 키로 저장합니다.
/// 행은 삽입 후 불변이며, 중복 삽입은 `ON CONFLICT DO NOTHING`으로
/// 흡수됩니다.
#[derive(Clone)]
pub struct CandleStore {
    pool: PgPool,
}

impl CandleStore {
    /// 새 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 특정 (symbol, timeframe)의 캔들 수 조회.
    pub async fn count(&self, symbol: &str, timeframe: Timeframe) -> Result<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM candles
            WHERE symbol = $1 AND timeframe = $2
            "#,
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        Ok(result.0)
    }

    /// 전체 커버리지 요약 조회.
    ///
    /// cache-stats 출력용: (symbol, timeframe)별 최초/최종 캔들 시각과 개수.
    pub async fn coverage(&self) -> Result<Vec<CoverageRecord>> {
        sqlx::query_as(
            r#"
            SELECT symbol, timeframe,
                   MIN(open_time) AS first_time,
                   MAX(open_time) AS last_time,
                   COUNT(*) AS candle_count
            FROM candles
            GROUP BY symbol, timeframe
            ORDER BY symbol, timeframe
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))
    }

    /// 특정 심볼의 모든 캔들 삭제.
    pub async fn clear_symbol(&self, symbol: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM candles WHERE symbol = $1")
            .bind(symbol)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::DeleteError(e.to_string()))?;

        info!(
            symbol = symbol,
            deleted = result.rows_affected(),
            "심볼 캔들 삭제"
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CandleRepository for CandleStore {
    #[instrument(skip(self))]
    async fn find_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>> {
        let records: Vec<CandleRecord> = sqlx::query_as(
            r#"
            SELECT symbol, timeframe, open_time, open, high, low, close, volume
            FROM candles
            WHERE symbol = $1 AND timeframe = $2
              AND ($3::timestamptz IS NULL OR open_time >= $3)
              AND ($4::timestamptz IS NULL OR open_time <= $4)
            ORDER BY open_time ASC
            "#,
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        let candles: Vec<Candle> = records.iter().map(CandleRecord::to_candle).collect();

        debug!(
            symbol = symbol,
            timeframe = %timeframe,
            count = candles.len(),
            "저장소에서 캔들 조회"
        );

        Ok(candles)
    }

    #[instrument(skip(self, candles), fields(count = candles.len()))]
    async fn insert_ignore_conflicts(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize> {
        if candles.is_empty() {
            return Ok(0);
        }

        let tf_str = timeframe.as_str();
        let mut inserted = 0;

        // UNNEST 패턴으로 일괄 삽입 (N+1 쿼리 문제 해결)
        for chunk in candles.chunks(500) {
            let symbols: Vec<&str> = chunk.iter().map(|_| symbol).collect();
            let timeframes: Vec<&str> = chunk.iter().map(|_| tf_str).collect();
            let open_times: Vec<DateTime<Utc>> = chunk.iter().map(|c| c.open_time).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|c| c.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|c| c.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|c| c.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|c| c.close).collect();
            let volumes: Vec<i64> = chunk.iter().map(|c| c.volume).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO candles
                    (symbol, timeframe, open_time, open, high, low, close, volume)
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::timestamptz[],
                    $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
                    $8::bigint[]
                )
                ON CONFLICT (symbol, timeframe, open_time) DO NOTHING
                "#,
            )
            .bind(&symbols)
            .bind(&timeframes)
            .bind(&open_times)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&volumes)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        info!(
            symbol = symbol,
            timeframe = %timeframe,
            received = candles.len(),
            inserted = inserted,
            "캔들 저장 완료"
        );

        Ok(inserted)
    }
}

// =============================================================================
// 테스트
// =============================================================================

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_record_to_candle() {
        let record = CandleRecord {
            symbol: "XAUUSD".to_string(),
            timeframe: "1h".to_string(),
            open_time: Utc::now(),
            open: dec!(2400),
            high: dec!(2410),
            low: dec!(2395),
            close: dec!(2405),
            volume: 1200,
        };

        let candle = record.to_candle();
        assert_eq!(candle.symbol, "XAUUSD");
        assert_eq!(candle.timeframe, Timeframe::H1);
        assert_eq!(candle.close, dec!(2405));
        assert_eq!(candle.volume, 1200);
    }

    #[test]
    fn test_record_with_unknown_timeframe_falls_back() {
        let record = CandleRecord {
            symbol: "XAUUSD".to_string(),
            timeframe: "legacy".to_string(),
            open_time: Utc::now(),
            open: dec!(1),
            high: dec!(1),
            low: dec!(1),
            close: dec!(1),
            volume: 0,
        };
        assert_eq!(record.to_candle().timeframe, Timeframe::D1);
    }
}
