//! 기술 지표 계산.
//!
//! 전략들이 공유하는 지표 함수입니다. 모두 `Decimal` 기반이며,
//! 데이터가 부족하면 `None`을 반환합니다.
//!
//! RSI와 ATR은 Wilder 평활을 사용합니다 (일반적인 차트 소프트웨어와
//! 동일한 값).

use rust_decimal::Decimal;

use aurum_core::Candle;

/// 단순 이동평균 (마지막 `period`개 값).
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values.iter().rev().take(period).sum();
    Some(sum / Decimal::from(period))
}

/// 지수 이동평균.
///
/// 초기값은 첫 `period`개의 SMA, 이후 `k = 2/(period+1)` 평활.
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }

    let seed: Decimal = values[..period].iter().sum::<Decimal>() / Decimal::from(period);
    let k = Decimal::from(2) / Decimal::from(period + 1);

    let mut ema = seed;
    for value in &values[period..] {
        ema += k * (*value - ema);
    }
    Some(ema)
}

/// RSI (Wilder 평활).
///
/// `period + 1`개 이상의 값이 필요합니다. 하락이 전혀 없으면 100.
pub fn rsi(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    for pair in values[..period + 1].windows(2) {
        let delta = pair[1] - pair[0];
        if delta > Decimal::ZERO {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    let period_dec = Decimal::from(period);
    let mut avg_gain = gains / period_dec;
    let mut avg_loss = losses / period_dec;

    // Wilder 평활: avg = (prev_avg × (period-1) + current) / period
    for pair in values[period..].windows(2) {
        let delta = pair[1] - pair[0];
        let (gain, loss) = if delta > Decimal::ZERO {
            (delta, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -delta)
        };
        avg_gain = (avg_gain * (period_dec - Decimal::ONE) + gain) / period_dec;
        avg_loss = (avg_loss * (period_dec - Decimal::ONE) + loss) / period_dec;
    }

    if avg_loss.is_zero() {
        return Some(Decimal::from(100));
    }

    let rs = avg_gain / avg_loss;
    Some(Decimal::from(100) - Decimal::from(100) / (Decimal::ONE + rs))
}

/// ATR (Wilder 평활).
///
/// TR = max(고가-저가, |고가-전일종가|, |저가-전일종가|).
/// `period + 1`개 이상의 캔들이 필요합니다.
pub fn atr(candles: &[Candle], period: usize) -> Option<Decimal> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let true_ranges: Vec<Decimal> = candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let current = &pair[1];
            let hl = current.high - current.low;
            let hc = (current.high - prev_close).abs();
            let lc = (current.low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect();

    let period_dec = Decimal::from(period);
    let mut atr = true_ranges[..period].iter().sum::<Decimal>() / period_dec;
    for tr in &true_ranges[period..] {
        atr = (atr * (period_dec - Decimal::ONE) + *tr) / period_dec;
    }
    Some(atr)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use aurum_core::Timeframe;

    use super::*;

    #[test]
    fn test_sma() {
        let values = vec![dec!(1), dec!(2), dec!(3), dec!(4)];
        assert_eq!(sma(&values, 2), Some(dec!(3.5)));
        assert_eq!(sma(&values, 4), Some(dec!(2.5)));
        assert_eq!(sma(&values, 5), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_ema_with_known_sequence() {
        // seed = sma([2,4]) = 3, k = 2/3
        // 6 → 3 + (6-3)·2/3 = 5
        // 8 → 5 + (8-5)·2/3 = 7
        // 10 → 7 + (10-7)·2/3 = 9
        // k = 2/3은 Decimal에서 순환소수이므로 반올림 후 비교
        let values = vec![dec!(2), dec!(4), dec!(6), dec!(8), dec!(10)];
        assert_eq!(ema(&values, 2).unwrap().round_dp(10), dec!(9));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values = vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)];
        assert_eq!(rsi(&values, 3), Some(dec!(100)));
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // deltas: +1, +1, -1, +1 (period 2)
        // seed: avg_gain=1, avg_loss=0
        // -1 → avg_gain=0.5, avg_loss=0.5
        // +1 → avg_gain=0.75, avg_loss=0.25 → RS=3 → RSI=75
        let values = vec![dec!(1), dec!(2), dec!(3), dec!(2), dec!(3)];
        assert_eq!(rsi(&values, 2), Some(dec!(75)));
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        let values = vec![dec!(1), dec!(2)];
        assert_eq!(rsi(&values, 2), None);
    }

    fn candle(hours: i64, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle::new(
            "XAUUSD",
            Timeframe::H1,
            Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap() + Duration::hours(hours),
            close,
            high,
            low,
            close,
            0,
        )
    }

    #[test]
    fn test_atr_simple_ranges() {
        // 각 캔들 TR이 전부 고가-저가 = 2 → ATR = 2
        let candles = vec![
            candle(0, dec!(11), dec!(9), dec!(10)),
            candle(1, dec!(11), dec!(9), dec!(10)),
            candle(2, dec!(11), dec!(9), dec!(10)),
            candle(3, dec!(11), dec!(9), dec!(10)),
        ];
        assert_eq!(atr(&candles, 3), Some(dec!(2)));
    }

    #[test]
    fn test_atr_uses_gap_from_prev_close() {
        // 갭 상승: |고가-전일종가| 가 TR을 지배
        let candles = vec![
            candle(0, dec!(11), dec!(9), dec!(10)),
            candle(1, dec!(20), dec!(19), dec!(19.5)), // TR = 20-10 = 10
        ];
        assert_eq!(atr(&candles, 1), Some(dec!(10)));
    }

    #[test]
    fn test_atr_needs_period_plus_one() {
        let candles = vec![candle(0, dec!(11), dec!(9), dec!(10))];
        assert_eq!(atr(&candles, 1), None);
    }
}
