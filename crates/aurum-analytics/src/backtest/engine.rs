//! 시뮬레이션 엔진.
//!
//! 확정된 캔들 시퀀스를 한 번에 하나씩 리플레이하며 전략을 실행합니다.
//! 단일 종목, 단일 포지션 엔진이며, 런마다 독립적이라 공유 상태가 없습니다.
//!
//! # 캔들당 처리 순서 (고정, 재배열 불가)
//!
//! 1. **청산 확인** — 열린 포지션의 손절/익절을 캔들 내 고가/저가로
//!    먼저 판정합니다. 손절을 익절보다 먼저 확인하고, 캔들당 최대
//!    한 번만 청산하며, 체결가는 정확히 손절/익절 가격입니다.
//! 2. **자산 기록** — 종가 기준 미실현 손익을 반영한 EquityPoint를
//!    거래 발생 여부와 무관하게 하나 추가합니다.
//! 3. **전략 실행** — `on_candle`이 반환한 의도를 순서대로 종가에
//!    체결합니다. 반대 방향 체결은 기존 포지션을 먼저 강제 청산합니다.
//!
//! 마지막 캔들 이후 열린 포지션은 그 캔들의 종가로 강제 청산됩니다.
//!
//! 같은 캔들에서 손절 도달과 신규 신호가 겹치면 반드시 청산이 먼저
//! 실행되어 신규 신호는 빈 포지션 상태에서 처리됩니다. 이 순서는
//! 백테스트/실거래 동형성을 위해 보존되어야 합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use aurum_core::{Candle, ClosedTrade, EquityPoint, OrderIntent, Side, TradeStatus};
use aurum_strategy::Strategy;

use crate::backtest::report::SimulationReport;

// =============================================================================
// 에러 / 설정
// =============================================================================

/// 시뮬레이션 오류.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// 설정 오류
    #[error("시뮬레이션 설정 오류: {0}")]
    ConfigError(String),

    /// 전략 훅에서 발생한 오류.
    ///
    /// 상태를 알 수 없는 전략으로 리플레이를 계속하지 않습니다.
    #[error("전략 실행 오류: {0}")]
    StrategyError(String),
}

/// 시뮬레이션 결과 타입.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// 시뮬레이션 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 초기 자본금
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
}

fn default_initial_balance() -> Decimal {
    Decimal::new(10_000, 0)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
        }
    }
}

impl SimulationConfig {
    /// 초기 자본으로 설정 생성.
    pub fn new(initial_balance: Decimal) -> Self {
        Self { initial_balance }
    }

    /// 설정 검증.
    pub fn validate(&self) -> SimulationResult<()> {
        if self.initial_balance <= Decimal::ZERO {
            return Err(SimulationError::ConfigError(
                "초기 자본은 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// 포지션
// =============================================================================

/// 열린 포지션 (시뮬레이션 내부 전용).
///
/// 런당 최대 하나만 존재하며(`Option`), 런 시작 시 빈 상태로 초기화되고
/// 런 종료 시 열려 있으면 강제 청산됩니다.
#[derive(Debug, Clone)]
struct OpenPosition {
    side: Side,
    volume: Decimal,
    entry_price: Decimal,
    entry_time: DateTime<Utc>,
    stop_loss: Option<Decimal>,
    take_profit: Option<Decimal>,
}

impl OpenPosition {
    /// 주어진 가격으로 청산 시의 실현 손익.
    fn realized_pnl(&self, exit_price: Decimal) -> Decimal {
        match self.side {
            Side::Buy => (exit_price - self.entry_price) * self.volume,
            Side::Sell => (self.entry_price - exit_price) * self.volume,
        }
    }

    /// 종가 기준 미실현 손익.
    fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.realized_pnl(price)
    }

    /// 캔들 내 손절/익절 도달 판정.
    ///
    /// 손절을 익절보다 먼저 확인하며, 먼저 충족된 조건 하나만 체결됩니다.
    /// 반환값은 정확한 손절/익절 가격입니다 (종가 아님).
    fn intrabar_exit_price(&self, candle: &Candle) -> Option<Decimal> {
        match self.side {
            Side::Buy => {
                if let Some(stop) = self.stop_loss {
                    if candle.low <= stop {
                        return Some(stop);
                    }
                }
                if let Some(target) = self.take_profit {
                    if candle.high >= target {
                        return Some(target);
                    }
                }
                None
            }
            Side::Sell => {
                if let Some(stop) = self.stop_loss {
                    if candle.high >= stop {
                        return Some(stop);
                    }
                }
                if let Some(target) = self.take_profit {
                    if candle.low <= target {
                        return Some(target);
                    }
                }
                None
            }
        }
    }

    /// 청산 거래 기록 생성.
    fn into_trade(self, exit_price: Decimal, exit_time: DateTime<Utc>) -> ClosedTrade {
        let pnl = self.realized_pnl(exit_price);
        ClosedTrade {
            entry_time: self.entry_time,
            exit_time,
            side: self.side,
            entry_price: self.entry_price,
            exit_price,
            volume: self.volume,
            pnl,
            status: TradeStatus::Closed,
        }
    }
}

// =============================================================================
// 엔진
// =============================================================================

/// 시뮬레이션 엔진.
///
/// 런마다 독립적인 상태로 실행되므로 엔진 인스턴스는 설정만 보유합니다.
/// 긴 리플레이를 요청 처리와 분리하는 오프로딩은 호출자의 책임입니다.
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    /// 새 엔진 생성.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// 설정 조회.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 캔들 시퀀스에 대해 전략을 리플레이.
    ///
    /// `candles`는 캐시 계층이 보장하는 시간 오름차순, 중복 없는
    /// 시퀀스여야 합니다. 빈 시퀀스는 빈 리포트를 반환합니다
    /// (엔진은 구간 내 입력에 대해 에러를 내지 않음).
    ///
    /// # Errors
    ///
    /// - `SimulationError::ConfigError`: 설정 검증 실패
    /// - `SimulationError::StrategyError`: 전략 훅에서 발생한 오류
    pub async fn run<S>(
        &self,
        strategy: &mut S,
        candles: &[Candle],
    ) -> SimulationResult<SimulationReport>
    where
        S: Strategy + ?Sized,
    {
        self.config.validate()?;

        if candles.is_empty() {
            return Ok(SimulationReport::empty(self.config.initial_balance));
        }

        strategy
            .on_start()
            .await
            .map_err(|e| SimulationError::StrategyError(e.to_string()))?;

        let mut balance = self.config.initial_balance;
        let mut position: Option<OpenPosition> = None;
        let mut trades: Vec<ClosedTrade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(candles.len());

        for candle in candles {
            // 1. 청산 확인: 전략이 캔들을 보기 전에 손절/익절 판정
            if let Some(exit_price) = position
                .as_ref()
                .and_then(|pos| pos.intrabar_exit_price(candle))
            {
                let pos = position.take().expect("청산 판정은 포지션 존재를 전제");
                let trade = pos.into_trade(exit_price, candle.open_time);
                balance += trade.pnl;
                debug!(
                    side = %trade.side,
                    exit_price = %exit_price,
                    pnl = %trade.pnl,
                    "손절/익절 체결"
                );
                trades.push(trade);
            }

            // 2. 자산 기록: 종가 기준 미실현 손익 반영
            let unrealized = position
                .as_ref()
                .map(|pos| pos.unrealized_pnl(candle.close))
                .unwrap_or(Decimal::ZERO);
            equity_curve.push(EquityPoint {
                time: candle.open_time,
                equity: balance + unrealized,
            });

            // 3. 전략 실행
            let intents = strategy
                .on_candle(candle)
                .await
                .map_err(|e| SimulationError::StrategyError(e.to_string()))?;

            for intent in intents {
                self.apply_intent(
                    &intent,
                    candle,
                    &mut balance,
                    &mut position,
                    &mut trades,
                );
            }
        }

        strategy
            .on_end()
            .await
            .map_err(|e| SimulationError::StrategyError(e.to_string()))?;

        // 마지막 캔들 이후 열린 포지션은 종가로 강제 청산
        if let Some(pos) = position.take() {
            let last = &candles[candles.len() - 1];
            let trade = pos.into_trade(last.close, last.open_time);
            balance += trade.pnl;
            debug!(pnl = %trade.pnl, "리플레이 종료: 잔여 포지션 강제 청산");
            trades.push(trade);
        }

        Ok(SimulationReport::from_replay(
            self.config.initial_balance,
            balance,
            trades,
            equity_curve,
            candles.len(),
        ))
    }

    /// 주문 의도 하나를 체결.
    ///
    /// 모든 체결은 캔들 종가로 이루어집니다 (슬리피지/부분 체결 없음).
    /// 반대 방향 포지션이 있으면 먼저 강제 청산한 뒤 새 포지션을 열고,
    /// 같은 방향 포지션이 있으면 수량을 더하되 진입가/시각과 손절/익절은
    /// 의도의 값으로 전면 교체합니다.
    fn apply_intent(
        &self,
        intent: &OrderIntent,
        candle: &Candle,
        balance: &mut Decimal,
        position: &mut Option<OpenPosition>,
        trades: &mut Vec<ClosedTrade>,
    ) {
        // 잘못된 의도는 해당 의도만 건너뛰고 리플레이는 계속
        if intent.volume <= Decimal::ZERO {
            warn!(
                side = %intent.side,
                volume = %intent.volume,
                "수량이 0 이하인 의도 거부"
            );
            return;
        }

        let fill_price = candle.close;

        // 반대 방향 포지션 강제 청산
        if position
            .as_ref()
            .is_some_and(|pos| pos.side != intent.side)
        {
            let pos = position.take().expect("방향 비교는 포지션 존재를 전제");
            let trade = pos.into_trade(fill_price, candle.open_time);
            *balance += trade.pnl;
            debug!(
                closed_side = %trade.side,
                pnl = %trade.pnl,
                "반대 방향 체결로 기존 포지션 청산"
            );
            trades.push(trade);
        }

        match position.as_mut() {
            Some(pos) => {
                // 같은 방향 추가 진입: 수량 합산, 진입가/손익절은 교체
                pos.volume += intent.volume;
                pos.entry_price = fill_price;
                pos.entry_time = candle.open_time;
                pos.stop_loss = intent.stop_loss;
                pos.take_profit = intent.take_profit;
            }
            None => {
                *position = Some(OpenPosition {
                    side: intent.side,
                    volume: intent.volume,
                    entry_price: fill_price,
                    entry_time: candle.open_time,
                    stop_loss: intent.stop_loss,
                    take_profit: intent.take_profit,
                });
            }
        }
    }
}

// =============================================================================
// 테스트용 전략
// =============================================================================


// =============================================================================
// 테스트
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::test_strategies::{FailingStrategy, ScriptedStrategy};
    use super::*;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
    }

    /// (고가, 저가, 종가)로 캔들 생성.
    fn candle(index: i64, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle::new(
            "XAUUSD",
            aurum_core::Timeframe::H1,
            base_time() + Duration::hours(index),
            close,
            high,
            low,
            close,
            100,
        )
    }

    fn engine() -> SimulationEngine {
        SimulationEngine::new(SimulationConfig::default())
    }

    fn scripted(entries: Vec<(usize, Vec<OrderIntent>)>) -> ScriptedStrategy {
        ScriptedStrategy::new(entries.into_iter().collect::<HashMap<_, _>>())
    }

    #[tokio::test]
    async fn empty_candles_yield_empty_report() {
        let mut strategy = scripted(vec![]);
        let report = engine().run(&mut strategy, &[]).await.unwrap();

        assert_eq!(report.data_points, 0);
        assert_eq!(report.total_return_pct, dec!(0));
        assert_eq!(report.win_rate, 0.0);
        assert!(report.trades.is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let engine = SimulationEngine::new(SimulationConfig::new(dec!(-1)));
        let mut strategy = scripted(vec![]);
        let candles = [candle(0, dec!(101), dec!(99), dec!(100))];

        let result = engine.run(&mut strategy, &candles).await;
        assert!(matches!(result, Err(SimulationError::ConfigError(_))));
    }

    #[tokio::test]
    async fn strategy_fault_aborts_run() {
        let mut strategy = FailingStrategy;
        let candles = [candle(0, dec!(101), dec!(99), dec!(100))];

        let result = engine().run(&mut strategy, &candles).await;
        assert!(matches!(result, Err(SimulationError::StrategyError(_))));
    }

    #[tokio::test]
    async fn end_of_run_force_close() {
        // 0번 캔들에서 매수, 손절/익절 없음 → 마지막 캔들 종가로 강제 청산
        let mut strategy = scripted(vec![(0, vec![OrderIntent::buy(dec!(1))])]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(106), dec!(101), dec!(105)),
            candle(2, dec!(111), dec!(106), dec!(110)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.entry_price, dec!(100));
        assert_eq!(trade.exit_price, dec!(110));
        // 진입 시각은 원래 캔들, 청산 시각은 마지막 캔들
        assert_eq!(trade.entry_time, candles[0].open_time);
        assert_eq!(trade.exit_time, candles[2].open_time);
        assert_eq!(trade.pnl, dec!(10));
        assert_eq!(report.final_balance, dec!(10010));
        assert_eq!(report.total_return_pct, dec!(0.1));
    }

    #[tokio::test]
    async fn stop_loss_fills_at_exact_stop_price() {
        let mut strategy = scripted(vec![(
            0,
            vec![OrderIntent::buy(dec!(2)).with_stop_loss(dec!(95))],
        )]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            // 저가가 손절가 아래로 침투, 종가는 회복
            candle(1, dec!(102), dec!(94), dec!(101)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        // 체결가는 종가(101)가 아니라 정확히 손절가(95)
        assert_eq!(trade.exit_price, dec!(95));
        assert_eq!(trade.pnl, dec!(-10)); // (95-100) × 2
        assert_eq!(report.final_balance, dec!(9990));
    }

    #[tokio::test]
    async fn stop_checked_before_target_same_candle() {
        // 같은 캔들에서 손절과 익절 모두 도달 가능 → 손절 우선
        let mut strategy = scripted(vec![(
            0,
            vec![OrderIntent::buy(dec!(1))
                .with_stop_loss(dec!(95))
                .with_take_profit(dec!(105))],
        )]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(106), dec!(94), dec!(100)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_price, dec!(95));
    }

    #[tokio::test]
    async fn take_profit_fills_at_exact_target_price() {
        let mut strategy = scripted(vec![(
            0,
            vec![OrderIntent::buy(dec!(1)).with_take_profit(dec!(105))],
        )]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(107), dec!(99), dec!(100)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_price, dec!(105));
        assert_eq!(report.trades[0].pnl, dec!(5));
    }

    #[tokio::test]
    async fn short_stop_triggers_on_high() {
        let mut strategy = scripted(vec![(
            0,
            vec![OrderIntent::sell(dec!(1)).with_stop_loss(dec!(105))],
        )]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(106), dec!(100), dec!(102)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.exit_price, dec!(105));
        assert_eq!(trade.pnl, dec!(-5)); // (100-105) × 1
    }

    #[tokio::test]
    async fn short_target_triggers_on_low() {
        let mut strategy = scripted(vec![(
            0,
            vec![OrderIntent::sell(dec!(1)).with_take_profit(dec!(95))],
        )]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(101), dec!(94), dec!(98)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_price, dec!(95));
        assert_eq!(report.trades[0].pnl, dec!(5));
    }

    #[tokio::test]
    async fn exit_checked_before_same_candle_signal() {
        // 1번 캔들: 저가가 손절(95)을 깨고, 같은 캔들에서 전략이 새 매수 신호
        let mut strategy = scripted(vec![
            (0, vec![OrderIntent::buy(dec!(1)).with_stop_loss(dec!(95))]),
            (1, vec![OrderIntent::buy(dec!(1))]),
        ]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(102), dec!(94), dec!(101)),
            candle(2, dec!(103), dec!(100), dec!(102)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        // 손절 청산 1건 + 새 포지션의 종료 청산 1건
        assert_eq!(report.trades.len(), 2);

        // 기존 포지션은 손절가로 먼저 청산됨
        let stop_trade = &report.trades[0];
        assert_eq!(stop_trade.exit_price, dec!(95));
        assert_eq!(stop_trade.exit_time, candles[1].open_time);

        // 새 매수는 빈 포지션 상태에서 1번 캔들 종가에 진입
        let new_trade = &report.trades[1];
        assert_eq!(new_trade.entry_price, dec!(101));
        assert_eq!(new_trade.entry_time, candles[1].open_time);
    }

    #[tokio::test]
    async fn opposite_intent_reverses_position() {
        // 매수 후 매도 신호 → 롱 청산 + 숏 진입
        let mut strategy = scripted(vec![
            (0, vec![OrderIntent::buy(dec!(1))]),
            (1, vec![OrderIntent::sell(dec!(2))]),
        ]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(111), dec!(105), dec!(110)),
            candle(2, dec!(109), dec!(104), dec!(105)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 2);

        // 롱은 110에 청산 (+10)
        let long_trade = &report.trades[0];
        assert_eq!(long_trade.side, Side::Buy);
        assert_eq!(long_trade.exit_price, dec!(110));
        assert_eq!(long_trade.pnl, dec!(10));

        // 숏(2 단위)은 종료 시 105에 청산 (+10)
        let short_trade = &report.trades[1];
        assert_eq!(short_trade.side, Side::Sell);
        assert_eq!(short_trade.entry_price, dec!(110));
        assert_eq!(short_trade.exit_price, dec!(105));
        assert_eq!(short_trade.pnl, dec!(10));

        assert_eq!(report.final_balance, dec!(10020));
    }

    #[tokio::test]
    async fn non_positive_volume_intent_is_skipped() {
        // 0 수량 의도는 건너뛰고, 뒤따르는 유효한 의도는 체결됨
        let mut strategy = scripted(vec![(
            0,
            vec![OrderIntent::buy(dec!(0)), OrderIntent::buy(dec!(1))],
        )]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(106), dec!(101), dec!(105)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].volume, dec!(1));
        assert_eq!(report.trades[0].pnl, dec!(5));
    }

    #[tokio::test]
    async fn equity_point_per_candle_with_unrealized_pnl() {
        let mut strategy = scripted(vec![(0, vec![OrderIntent::buy(dec!(1))])]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(111), dec!(105), dec!(110)),
            candle(2, dec!(96), dec!(94), dec!(95)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        // 캔들마다 정확히 하나의 EquityPoint
        assert_eq!(report.equity_curve.len(), 3);
        // 0번: 진입 전 마크 → 초기 자본
        assert_eq!(report.equity_curve[0].equity, dec!(10000));
        // 1번: 미실현 +10
        assert_eq!(report.equity_curve[1].equity, dec!(10010));
        // 2번: 미실현 -5
        assert_eq!(report.equity_curve[2].equity, dec!(9995));
    }

    #[tokio::test]
    async fn add_to_position_replaces_entry_and_levels() {
        let mut strategy = scripted(vec![
            (0, vec![OrderIntent::buy(dec!(1)).with_stop_loss(dec!(90))]),
            (1, vec![OrderIntent::buy(dec!(1)).with_stop_loss(dec!(100))]),
        ]);
        let candles = [
            candle(0, dec!(101), dec!(99), dec!(100)),
            candle(1, dec!(111), dec!(105), dec!(110)),
            // 저가 99 → 교체된 손절 100에 도달 (기존 90이었다면 통과)
            candle(2, dec!(112), dec!(99), dec!(111)),
        ];

        let report = engine().run(&mut strategy, &candles).await.unwrap();

        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        // 수량은 합산, 진입가는 마지막 체결가로 교체
        assert_eq!(trade.volume, dec!(2));
        assert_eq!(trade.entry_price, dec!(110));
        assert_eq!(trade.exit_price, dec!(100));
        assert_eq!(trade.pnl, dec!(-20)); // (100-110) × 2
    }
}
