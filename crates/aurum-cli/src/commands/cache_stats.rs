//! 캐시 커버리지 출력 명령.

use aurum_data::{CandleStore, Database, DatabaseConfig};

use crate::config::AurumConfig;

/// 저장소의 (symbol, timeframe)별 커버리지 요약 출력.
pub async fn run_cache_stats(config: &AurumConfig) -> anyhow::Result<()> {
    let db = Database::connect(&DatabaseConfig::new(&config.database_url)).await?;
    db.ensure_schema().await?;
    let store = CandleStore::new(db.pool().clone());

    let records = store.coverage().await?;
    if records.is_empty() {
        println!("캐시된 캔들이 없습니다.");
        return Ok(());
    }

    println!(
        "{:<12} {:<6} {:<22} {:<22} {:>8}",
        "SYMBOL", "TF", "FIRST", "LAST", "COUNT"
    );
    for record in records {
        let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:<12} {:<6} {:<22} {:<22} {:>8}",
            record.symbol,
            record.timeframe,
            fmt_time(record.first_time),
            fmt_time(record.last_time),
            record.candle_count,
        );
    }

    Ok(())
}
