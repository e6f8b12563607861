//! 이동평균 크로스오버 전략.
//!
//! 단기 SMA가 장기 SMA를 상향 돌파하면 매수, 하향 돌파하면 매도하는
//! 양방향 반전 전략입니다. 반대 방향 체결이 기존 포지션을 먼저
//! 청산하므로 크로스마다 의도 하나만 반환합니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aurum_core::{Candle, OrderIntent};

use crate::strategies::common::indicators::sma;
use crate::traits::{Strategy, StrategyError};

/// 내부 포지션 추적 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackedPosition {
    Flat,
    Long,
    Short,
}

/// MA 크로스오버 전략 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaCrossConfig {
    /// 단기 이동평균 기간
    #[serde(default = "default_short_window")]
    pub short_window: usize,

    /// 장기 이동평균 기간
    #[serde(default = "default_long_window")]
    pub long_window: usize,

    /// 주문 수량 (고정)
    #[serde(default = "default_position_size")]
    pub position_size: Decimal,
}

fn default_short_window() -> usize {
    10
}
fn default_long_window() -> usize {
    30
}
fn default_position_size() -> Decimal {
    dec!(0.1)
}

impl Default for MaCrossConfig {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
            position_size: default_position_size(),
        }
    }
}

/// 이동평균 크로스오버 전략.
pub struct MaCrossStrategy {
    config: MaCrossConfig,
    prices: Vec<Decimal>,
    position: TrackedPosition,
}

impl MaCrossStrategy {
    /// 설정으로 전략 생성.
    pub fn new(config: MaCrossConfig) -> Self {
        Self {
            config,
            prices: Vec::new(),
            position: TrackedPosition::Flat,
        }
    }
}

impl Default for MaCrossStrategy {
    fn default() -> Self {
        Self::new(MaCrossConfig::default())
    }
}

#[async_trait]
impl Strategy for MaCrossStrategy {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn description(&self) -> &str {
        "단기/장기 이동평균 크로스오버 반전 전략"
    }

    async fn on_start(&mut self) -> Result<(), StrategyError> {
        self.prices.clear();
        self.position = TrackedPosition::Flat;
        debug!(
            short = self.config.short_window,
            long = self.config.long_window,
            "MA 크로스 전략 시작"
        );
        Ok(())
    }

    async fn on_candle(&mut self, candle: &Candle) -> Result<Vec<OrderIntent>, StrategyError> {
        self.prices.push(candle.close);

        // 크로스 판정에는 직전 MA도 필요
        if self.prices.len() < self.config.long_window + 1 {
            return Ok(vec![]);
        }

        let short_ma = sma(&self.prices, self.config.short_window);
        let long_ma = sma(&self.prices, self.config.long_window);
        let prev = &self.prices[..self.prices.len() - 1];
        let prev_short_ma = sma(prev, self.config.short_window);
        let prev_long_ma = sma(prev, self.config.long_window);

        let (Some(short_ma), Some(long_ma), Some(prev_short_ma), Some(prev_long_ma)) =
            (short_ma, long_ma, prev_short_ma, prev_long_ma)
        else {
            return Ok(vec![]);
        };

        // 골든 크로스 (단기가 장기를 상향 돌파)
        if prev_short_ma <= prev_long_ma
            && short_ma > long_ma
            && self.position != TrackedPosition::Long
        {
            self.position = TrackedPosition::Long;
            debug!(price = %candle.close, "골든 크로스 → 매수");
            return Ok(vec![OrderIntent::buy(self.config.position_size)]);
        }

        // 데드 크로스 (단기가 장기를 하향 돌파)
        if prev_short_ma >= prev_long_ma
            && short_ma < long_ma
            && self.position != TrackedPosition::Short
        {
            self.position = TrackedPosition::Short;
            debug!(price = %candle.close, "데드 크로스 → 매도");
            return Ok(vec![OrderIntent::sell(self.config.position_size)]);
        }

        Ok(vec![])
    }
}
