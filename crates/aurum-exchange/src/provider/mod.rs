//! CandleProvider 구현체.
//!
//! 업스트림 시세 API별 클라이언트를 제공합니다. 현재는 Twelve Data
//! REST API 하나를 지원하며, 모든 구현체는 `aurum_core::CandleProvider`
//! trait를 따릅니다.

mod twelve_data;

pub use twelve_data::{TwelveDataConfig, TwelveDataProvider};
