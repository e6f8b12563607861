//! 골든 모멘텀 전략.
//!
//! 높은 승률과 낮은 낙폭을 노리는 H1 롱 전용 전략입니다.
//!
//! # 진입 조건
//!
//! 1. 추세: EMA(fast) > EMA(slow) (골든 크로스 정렬)
//! 2. 가격 구조: 종가 > EMA(fast) (추세 존중)
//! 3. 모멘텀: rsi_min < RSI < rsi_max (건전한 눌림목, 과매수 아님)
//!
//! # 리스크 관리
//!
//! - 손절: 2 × ATR (변동성 기반)
//! - 익절: 3 × ATR (1.5 손익비)
//! - 수량: 자본의 risk_percent 만큼 리스크, 레버리지 100배 상한

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aurum_core::{Candle, OrderIntent};

use crate::strategies::common::indicators::{atr, ema, rsi};
use crate::traits::{Strategy, StrategyError};

/// 지표 안정화에 필요한 추가 캔들 수.
const WARMUP_EXTRA: usize = 50;

/// 골든 모멘텀 전략 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenMomentumConfig {
    /// 빠른 EMA 기간
    #[serde(default = "default_ema_fast")]
    pub ema_fast_period: usize,

    /// 느린 EMA 기간
    #[serde(default = "default_ema_slow")]
    pub ema_slow_period: usize,

    /// RSI 기간
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// ATR 기간
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// RSI 하한 (눌림목 판정)
    #[serde(default = "default_rsi_min")]
    pub rsi_min: Decimal,

    /// RSI 상한 (과매수 배제)
    #[serde(default = "default_rsi_max")]
    pub rsi_max: Decimal,

    /// 거래당 리스크 비율 (예: 0.02 = 자본의 2%)
    #[serde(default = "default_risk_percent")]
    pub risk_percent: Decimal,

    /// 손절 거리 배수 (ATR 기준)
    #[serde(default = "default_atr_sl_mult")]
    pub atr_sl_mult: Decimal,

    /// 익절 거리 배수 (ATR 기준)
    #[serde(default = "default_atr_tp_mult")]
    pub atr_tp_mult: Decimal,

    /// 수량 계산용 추정 자본
    #[serde(default = "default_account_balance")]
    pub account_balance: Decimal,
}

fn default_ema_fast() -> usize {
    50
}
fn default_ema_slow() -> usize {
    200
}
fn default_rsi_period() -> usize {
    14
}
fn default_atr_period() -> usize {
    14
}
fn default_rsi_min() -> Decimal {
    dec!(40)
}
fn default_rsi_max() -> Decimal {
    dec!(65)
}
fn default_risk_percent() -> Decimal {
    dec!(0.02)
}
fn default_atr_sl_mult() -> Decimal {
    dec!(2.0)
}
fn default_atr_tp_mult() -> Decimal {
    dec!(3.0)
}
fn default_account_balance() -> Decimal {
    dec!(10000)
}

impl Default for GoldenMomentumConfig {
    fn default() -> Self {
        Self {
            ema_fast_period: default_ema_fast(),
            ema_slow_period: default_ema_slow(),
            rsi_period: default_rsi_period(),
            atr_period: default_atr_period(),
            rsi_min: default_rsi_min(),
            rsi_max: default_rsi_max(),
            risk_percent: default_risk_percent(),
            atr_sl_mult: default_atr_sl_mult(),
            atr_tp_mult: default_atr_tp_mult(),
            account_balance: default_account_balance(),
        }
    }
}

/// 골든 모멘텀 전략.
pub struct GoldenMomentumStrategy {
    config: GoldenMomentumConfig,
    candles: Vec<Candle>,
}

impl GoldenMomentumStrategy {
    /// 설정으로 전략 생성.
    pub fn new(config: GoldenMomentumConfig) -> Self {
        Self {
            config,
            candles: Vec::new(),
        }
    }

    /// 리스크 기반 수량 계산.
    ///
    /// 1. 리스크 금액 / 손절 거리 = 리스크 기반 수량
    /// 2. 자본 × 최대 레버리지(100배) / 가격 = 수량 상한
    /// 둘 중 작은 값을 소수점 둘째 자리로 반올림.
    fn position_size(&self, price: Decimal, stop_loss_dist: Decimal) -> Decimal {
        let risk_amount = self.config.account_balance * self.config.risk_percent;
        let risk_units = risk_amount / stop_loss_dist;

        let max_leverage = dec!(100);
        let max_units = self.config.account_balance * max_leverage / price;

        risk_units.min(max_units).round_dp(2)
    }
}

impl Default for GoldenMomentumStrategy {
    fn default() -> Self {
        Self::new(GoldenMomentumConfig::default())
    }
}

#[async_trait]
impl Strategy for GoldenMomentumStrategy {
    fn name(&self) -> &str {
        "golden_momentum"
    }

    fn description(&self) -> &str {
        "EMA 추세 정렬 + RSI 눌림목 진입, ATR 기반 손절/익절 (롱 전용)"
    }

    async fn on_start(&mut self) -> Result<(), StrategyError> {
        self.candles.clear();
        Ok(())
    }

    async fn on_candle(&mut self, candle: &Candle) -> Result<Vec<OrderIntent>, StrategyError> {
        self.candles.push(candle.clone());

        // 지표 안정화 전에는 신호 없음
        if self.candles.len() < self.config.ema_slow_period + WARMUP_EXTRA {
            return Ok(vec![]);
        }

        let closes: Vec<Decimal> = self.candles.iter().map(|c| c.close).collect();

        let (Some(ema_fast), Some(ema_slow), Some(rsi_value), Some(atr_value)) = (
            ema(&closes, self.config.ema_fast_period),
            ema(&closes, self.config.ema_slow_period),
            rsi(&closes, self.config.rsi_period),
            atr(&self.candles, self.config.atr_period),
        ) else {
            return Ok(vec![]);
        };

        let price = candle.close;

        // 1. 추세 정렬
        let is_uptrend = ema_fast > ema_slow;
        // 2. 가격 구조
        let price_respects_trend = price > ema_fast;
        // 3. 모멘텀 (눌림목이되 급락 아님)
        let valid_momentum = rsi_value > self.config.rsi_min && rsi_value < self.config.rsi_max;

        if !(is_uptrend && price_respects_trend && valid_momentum) {
            return Ok(vec![]);
        }

        // ATR이 너무 작으면 수량이 폭주하므로 진입하지 않음 (금 기준 $0.50)
        if atr_value < dec!(0.5) {
            return Ok(vec![]);
        }

        let stop_loss_dist = atr_value * self.config.atr_sl_mult;
        let units = self.position_size(price, stop_loss_dist);
        if units <= Decimal::ZERO {
            return Ok(vec![]);
        }

        debug!(
            price = %price,
            atr = %atr_value,
            rsi = %rsi_value,
            units = %units,
            "골든 모멘텀 진입 신호"
        );

        Ok(vec![OrderIntent::buy(units)
            .with_stop_loss(price - stop_loss_dist)
            .with_take_profit(price + atr_value * self.config.atr_tp_mult)])
    }
}
