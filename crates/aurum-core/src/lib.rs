//! Aurum 핵심 도메인 타입.
//!
//! 캔들, 타임프레임, 주문 의도, 거래 기록 등 모든 크레이트가 공유하는
//! 중립 타입과 데이터 소스 추상화(`CandleProvider`)를 제공합니다.
//!
//! # 모듈 구조
//!
//! - [`domain::candle`]: 캔들(`Candle`)과 타임프레임(`Timeframe`)
//! - [`domain::order`]: 매매 방향(`Side`)과 주문 의도(`OrderIntent`)
//! - [`domain::trade`]: 완료 거래(`ClosedTrade`)와 자산 곡선 포인트(`EquityPoint`)
//! - [`domain::provider`]: 시세 데이터 제공자 추상화(`CandleProvider`)

pub mod domain;

pub use domain::candle::{Candle, Timeframe};
pub use domain::order::{OrderIntent, Side};
pub use domain::provider::{CandleProvider, ProviderError};
pub use domain::trade::{ClosedTrade, EquityPoint, TradeStatus};
