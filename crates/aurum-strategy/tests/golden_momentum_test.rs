//! 골든 모멘텀 전략 통합 테스트.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use aurum_core::{Candle, Side, Timeframe};
use aurum_strategy::strategies::golden_momentum::{GoldenMomentumConfig, GoldenMomentumStrategy};
use aurum_strategy::Strategy;

/// 종가 시퀀스를 1시간봉으로 변환 (고가/저가는 ±1).
fn candles_from_closes(closes: &[Decimal]) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            Candle::new(
                "XAUUSD",
                Timeframe::H1,
                base + Duration::hours(i as i64),
                close,
                close + dec!(1),
                close - dec!(1),
                close,
                100,
            )
        })
        .collect()
}

/// 짧은 지표 기간 설정 (warmup = 5 + 50 = 55 캔들).
fn test_config() -> GoldenMomentumConfig {
    GoldenMomentumConfig {
        ema_fast_period: 3,
        ema_slow_period: 5,
        rsi_period: 3,
        atr_period: 3,
        ..GoldenMomentumConfig::default()
    }
}

/// RSI 필터를 비활성화한 설정 (추세/구조 조건만 검증).
fn config_without_rsi_filter() -> GoldenMomentumConfig {
    GoldenMomentumConfig {
        rsi_min: dec!(0),
        rsi_max: dec!(101),
        ..test_config()
    }
}

async fn run(strategy: &mut GoldenMomentumStrategy, closes: &[Decimal]) -> Vec<aurum_core::OrderIntent> {
    strategy.on_start().await.unwrap();
    let mut intents = Vec::new();
    for candle in &candles_from_closes(closes) {
        intents.extend(strategy.on_candle(candle).await.unwrap());
    }
    intents
}

/// 일정하게 상승하는 종가 시퀀스.
fn rising_closes(count: usize) -> Vec<Decimal> {
    (0..count)
        .map(|i| dec!(2000) + Decimal::from(i as i64) * dec!(2))
        .collect()
}

#[tokio::test]
async fn uptrend_with_relaxed_rsi_enters_long() {
    let mut strategy = GoldenMomentumStrategy::new(config_without_rsi_filter());
    let intents = run(&mut strategy, &rising_closes(60)).await;

    assert!(!intents.is_empty());
    let first = &intents[0];
    assert_eq!(first.side, Side::Buy);
    assert!(first.volume > Decimal::ZERO);

    // 손절은 진입가 아래, 익절은 위 (1.5 손익비)
    let stop = first.stop_loss.unwrap();
    let target = first.take_profit.unwrap();
    assert!(stop < target);
}

#[tokio::test]
async fn pure_uptrend_is_overbought_with_default_rsi_band() {
    // 하락이 전혀 없으면 RSI = 100 > rsi_max(65) → 과매수로 진입 안 함
    let mut strategy = GoldenMomentumStrategy::new(test_config());
    let intents = run(&mut strategy, &rising_closes(60)).await;
    assert!(intents.is_empty());
}

#[tokio::test]
async fn downtrend_never_enters() {
    let mut strategy = GoldenMomentumStrategy::new(config_without_rsi_filter());
    let closes: Vec<Decimal> = (0..60)
        .map(|i| dec!(2400) - Decimal::from(i as i64) * dec!(2))
        .collect();
    let intents = run(&mut strategy, &closes).await;
    assert!(intents.is_empty());
}

#[tokio::test]
async fn warmup_period_is_silent() {
    let mut strategy = GoldenMomentumStrategy::new(config_without_rsi_filter());
    // warmup(55개) 미만이면 어떤 시퀀스여도 무신호
    let intents = run(&mut strategy, &rising_closes(54)).await;
    assert!(intents.is_empty());
}

#[tokio::test]
async fn tiny_atr_blocks_entry() {
    // 고가=저가=종가(변동 없음) → ATR ≈ 0 < $0.50 가드
    let mut strategy = GoldenMomentumStrategy::new(config_without_rsi_filter());
    strategy.on_start().await.unwrap();

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut intents = Vec::new();
    for i in 0..60u32 {
        // 아주 완만한 상승 (캔들 범위 0.01)
        let close = dec!(2000) + Decimal::from(i) * dec!(0.05);
        let candle = Candle::new(
            "XAUUSD",
            Timeframe::H1,
            base + Duration::hours(i as i64),
            close,
            close + dec!(0.005),
            close - dec!(0.005),
            close,
            100,
        );
        intents.extend(strategy.on_candle(&candle).await.unwrap());
    }

    assert!(intents.is_empty());
}
