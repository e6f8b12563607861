//! 백테스트 명령.
//!
//! 캐시 계층을 통해 캔들을 확보한 뒤 시뮬레이션 엔진으로 리플레이하고
//! 결과 리포트와 캐시 메트릭을 출력합니다.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use aurum_analytics::{SimulationConfig, SimulationEngine};
use aurum_core::Timeframe;
use aurum_data::{CacheMetrics, CachedCandleProvider, CandleStore, Database, DatabaseConfig};
use aurum_exchange::{TwelveDataConfig, TwelveDataProvider};
use aurum_strategy::build_strategy;

use crate::config::AurumConfig;

/// 날짜 인자 파싱.
///
/// "YYYY-MM-DD"는 자정으로, "YYYY-MM-DD HH:MM:SS"는 그대로 해석합니다.
fn parse_date_arg(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).expect("자정은 항상 유효").and_utc());
    }
    bail!("날짜 형식이 올바르지 않습니다: {}", value)
}

/// 백테스트 실행.
#[allow(clippy::too_many_arguments)]
pub async fn run_backtest(
    config: &AurumConfig,
    symbol: String,
    timeframe: String,
    from: Option<String>,
    to: Option<String>,
    strategy_name: String,
    params: Option<String>,
    limit: usize,
) -> anyhow::Result<()> {
    let timeframe: Timeframe = timeframe
        .parse()
        .map_err(|e: String| anyhow::anyhow!("타임프레임 파싱 실패: {}", e))?;
    let start = from.as_deref().map(parse_date_arg).transpose()?;
    let end = to.as_deref().map(parse_date_arg).transpose()?;

    let params: serde_json::Value = match params {
        Some(raw) => serde_json::from_str(&raw).context("전략 파라미터는 JSON 객체여야 합니다")?,
        None => serde_json::json!({}),
    };

    // 저장소 + 업스트림 + 메트릭 조립
    let db = Database::connect(&DatabaseConfig::new(&config.database_url)).await?;
    db.ensure_schema().await?;
    let store = Arc::new(CandleStore::new(db.pool().clone()));
    let provider = Arc::new(TwelveDataProvider::new(
        TwelveDataConfig::new(&config.twelve_data_api_key)
            .with_min_request_interval(config.rate_limit_interval),
    ));
    let metrics = Arc::new(CacheMetrics::new());
    let cache = CachedCandleProvider::new(store, provider, metrics.clone());

    // 캔들 확보 (누락 구간만 업스트림 조회)
    let candles = cache
        .get_candles(&symbol, timeframe, start, end, limit)
        .await?;
    if candles.is_empty() {
        bail!("캔들 데이터가 없습니다: {} {}", symbol, timeframe);
    }

    // 전략 생성 및 리플레이
    let mut strategy = build_strategy(&strategy_name, params)?;
    let engine = SimulationEngine::new(SimulationConfig::default());
    let report = engine.run(strategy.as_mut(), &candles).await?;

    println!("{}", report.summary());

    let snapshot = metrics.snapshot();
    println!(
        "\n캐시 메트릭: 히트 {} / 부분 히트 {} / 미스 {} (API 호출 {})",
        snapshot.cache_hits,
        snapshot.partial_cache_hits,
        snapshot.cache_misses,
        snapshot.api_calls,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_parse_date_arg_date_only() {
        let dt = parse_date_arg("2024-06-10").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 6, 10));
        assert_eq!((dt.hour(), dt.minute()), (0, 0));
    }

    #[test]
    fn test_parse_date_arg_full_datetime() {
        let dt = parse_date_arg("2024-06-10 13:45:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (13, 45));
    }

    #[test]
    fn test_parse_date_arg_rejects_garbage() {
        assert!(parse_date_arg("10/06/2024").is_err());
        assert!(parse_date_arg("오늘").is_err());
    }
}
