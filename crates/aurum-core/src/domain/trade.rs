//! 거래 기록과 자산 곡선 타입.
//!
//! 시뮬레이션 결과로 생성되는 읽기 전용 타입입니다.
//! `ClosedTrade`는 포지션 청산 시점마다 정확히 한 번 생성되며
//! 이후 수정되지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::Side;

/// 거래 상태.
///
/// 시뮬레이션 엔진은 항상 `Closed` 거래만 생성합니다.
/// `Open`은 실거래 기록과의 API 호환을 위해 유지됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// 진행 중 (실거래 전용)
    Open,
    /// 청산 완료
    Closed,
}

/// 완료된 거래 (라운드트립).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    /// 진입 시각
    pub entry_time: DateTime<Utc>,
    /// 청산 시각
    pub exit_time: DateTime<Utc>,
    /// 진입 방향 (매수 포지션이면 buy)
    pub side: Side,
    /// 진입 가격
    pub entry_price: Decimal,
    /// 청산 가격
    pub exit_price: Decimal,
    /// 수량
    pub volume: Decimal,
    /// 실현 손익
    pub pnl: Decimal,
    /// 거래 상태
    pub status: TradeStatus,
}

impl ClosedTrade {
    /// 수익 거래 여부.
    ///
    /// 손익이 0인 거래는 수익으로 계산하지 않습니다.
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

/// 자산 곡선의 한 포인트.
///
/// 캔들마다 하나씩 생성되며, 최대 낙폭 계산에 사용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 측정 시각
    pub time: DateTime<Utc>,
    /// 자산 가치 (잔고 + 미실현 손익)
    pub equity: Decimal,
}
