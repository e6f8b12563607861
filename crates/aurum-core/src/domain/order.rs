//! 매매 방향과 주문 의도 타입.
//!
//! 전략은 엔진 상태를 직접 변경하지 않고, 캔들마다 0개 이상의
//! `OrderIntent`를 반환하는 것으로만 영향을 미칩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 매매 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 반대 방향.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// 전략이 생성한 주문 의도.
///
/// 체결은 전부 해당 캔들의 종가로 이루어지며(슬리피지/부분 체결 없음),
/// 손절/익절 가격은 의도에 포함된 값이 기존 값을 대체합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// 매매 방향
    pub side: Side,
    /// 주문 수량 (양수만 유효, 0 이하는 엔진에서 거부)
    pub volume: Decimal,
    /// 손절 가격 (선택)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    /// 익절 가격 (선택)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
}

impl OrderIntent {
    /// 새 주문 의도 생성.
    pub fn new(side: Side, volume: Decimal) -> Self {
        Self {
            side,
            volume,
            stop_loss: None,
            take_profit: None,
        }
    }

    /// 매수 의도 생성.
    pub fn buy(volume: Decimal) -> Self {
        Self::new(Side::Buy, volume)
    }

    /// 매도 의도 생성.
    pub fn sell(volume: Decimal) -> Self {
        Self::new(Side::Sell, volume)
    }

    /// 손절 가격 설정.
    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price);
        self
    }

    /// 익절 가격 설정.
    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price);
        self
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_intent_builder() {
        let intent = OrderIntent::buy(dec!(0.5))
            .with_stop_loss(dec!(2380))
            .with_take_profit(dec!(2450));
        assert_eq!(intent.side, Side::Buy);
        assert_eq!(intent.volume, dec!(0.5));
        assert_eq!(intent.stop_loss, Some(dec!(2380)));
        assert_eq!(intent.take_profit, Some(dec!(2450)));
    }

    #[test]
    fn test_intent_serde_omits_missing_levels() {
        let json = serde_json::to_value(OrderIntent::sell(dec!(1))).unwrap();
        assert_eq!(json["side"], "sell");
        assert!(json.get("stop_loss").is_none());
        assert!(json.get("take_profit").is_none());
    }
}
