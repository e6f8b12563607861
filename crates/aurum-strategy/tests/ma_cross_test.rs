//! MA 크로스오버 전략 통합 테스트.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use aurum_core::{Candle, Side, Timeframe};
use aurum_strategy::strategies::ma_cross::{MaCrossConfig, MaCrossStrategy};
use aurum_strategy::Strategy;

/// 종가 시퀀스를 1시간봉으로 변환.
fn candles_from_closes(closes: &[Decimal]) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
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

/// 테스트용 짧은 윈도우 설정.
fn test_config() -> MaCrossConfig {
    MaCrossConfig {
        short_window: 3,
        long_window: 5,
        position_size: dec!(0.1),
    }
}

#[tokio::test]
async fn warmup_produces_no_signals() {
    let mut strategy = MaCrossStrategy::new(test_config());
    strategy.on_start().await.unwrap();

    // long_window + 1 = 6개 미만에서는 항상 무신호
    let candles = candles_from_closes(&[dec!(10), dec!(9), dec!(8), dec!(7), dec!(6)]);
    for candle in &candles {
        let intents = strategy.on_candle(candle).await.unwrap();
        assert!(intents.is_empty());
    }
}

#[tokio::test]
async fn cross_sequence_emits_buy_then_sell() {
    let mut strategy = MaCrossStrategy::new(test_config());
    strategy.on_start().await.unwrap();

    // 하락 → 상승(골든 크로스) → 하락(데드 크로스)
    let closes: Vec<Decimal> = [
        10, 9, 8, 7, 6, // 하락
        7, 8, 9, 10, 11, 12, // 상승
        11, 10, 9, 8, 7, 6, 5, // 하락
    ]
    .iter()
    .map(|&v| Decimal::from(v))
    .collect();

    let mut intents = Vec::new();
    for candle in &candles_from_closes(&closes) {
        intents.extend(strategy.on_candle(candle).await.unwrap());
    }

    // 크로스마다 의도 하나: 매수 1회 후 매도 1회
    assert_eq!(intents.len(), 2);
    assert_eq!(intents[0].side, Side::Buy);
    assert_eq!(intents[0].volume, dec!(0.1));
    assert_eq!(intents[1].side, Side::Sell);
    assert_eq!(intents[1].volume, dec!(0.1));

    // MA 크로스 전략은 손절/익절을 지정하지 않음
    assert!(intents[0].stop_loss.is_none());
    assert!(intents[0].take_profit.is_none());
}

#[tokio::test]
async fn on_start_resets_state() {
    let mut strategy = MaCrossStrategy::new(test_config());
    strategy.on_start().await.unwrap();

    let closes: Vec<Decimal> = [10, 9, 8, 7, 6, 7, 8, 9, 10, 11]
        .iter()
        .map(|&v| Decimal::from(v))
        .collect();
    let candles = candles_from_closes(&closes);

    let mut first_run = Vec::new();
    for candle in &candles {
        first_run.extend(strategy.on_candle(candle).await.unwrap());
    }
    assert!(!first_run.is_empty());

    // 재시작 후 같은 데이터는 같은 신호를 생성
    strategy.on_start().await.unwrap();
    let mut second_run = Vec::new();
    for candle in &candles {
        second_run.extend(strategy.on_candle(candle).await.unwrap());
    }
    assert_eq!(first_run, second_run);
}
