//! 업스트림 시세 데이터 커넥터.
//!
//! Twelve Data REST API 클라이언트와 요청 간격 제한기(`RateLimiter`),
//! 일시적 오류 재시도 유틸리티(`retry`)를 제공합니다.
//!
//! 모든 구현체는 `aurum_core::CandleProvider` trait를 구현하여
//! 캐시 계층(`aurum-data`)에서 데이터 소스 중립적으로 사용됩니다.

pub mod provider;
pub mod rate_limit;
pub mod retry;

pub use provider::{TwelveDataConfig, TwelveDataProvider};
pub use rate_limit::RateLimiter;
pub use retry::{with_retry, RetryConfig};
