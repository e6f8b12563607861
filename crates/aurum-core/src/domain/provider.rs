//! 시세 데이터 제공자 추상화.
//!
//! 업스트림 시세 API(Twelve Data 등)로부터 캔들을 조회하기 위한
//! 데이터 소스 중립 인터페이스를 제공합니다. 캐시 계층은 이 trait에만
//! 의존하므로 테스트에서는 인메모리 구현으로 대체할 수 있습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::candle::{Candle, Timeframe};

// =============================================================================
// 에러 타입
// =============================================================================

/// 데이터 제공자 에러.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/전송 에러 (일시적, 재시도 가능)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 업스트림 API 에러 응답
    #[error("API 에러: {0}")]
    Api(String),

    /// 응답 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 요청 한도 초과
    #[error("요청 한도 초과: {0}")]
    RateLimited(String),

    /// 인증 실패 (API 키 오류 등)
    #[error("인증 실패: {0}")]
    Authentication(String),
}

impl ProviderError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 네트워크 장애와 요청 한도 초과만 재시도 대상입니다.
    /// API 에러와 파싱 실패는 재시도해도 같은 결과가 나옵니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::RateLimited(_)
        )
    }

    /// 치명적 에러인지 확인.
    ///
    /// 인증 실패는 설정 문제이므로 재시도 없이 즉시 반환합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Authentication(_))
    }

    /// 에러에 지정된 재시도 대기 시간 (밀리초).
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            // 분당 한도 기반 API이므로 한도 초과 시 1분 대기
            ProviderError::RateLimited(_) => Some(60_000),
            _ => None,
        }
    }
}

// =============================================================================
// CandleProvider Trait
// =============================================================================

/// 캔들 데이터 제공자 trait.
///
/// 업스트림 소스에서 캔들을 조회합니다. 구현체는 다음 계약을 지켜야 합니다:
///
/// - 반환 캔들은 시간 오름차순으로 정렬됩니다.
/// - 부분 성공은 없습니다: 모든 행이 파싱되거나 에러를 반환합니다.
/// - `end`만 주어진 경우 `limit` 개의 캔들을 확보할 수 있도록
///   합성 `start`를 계산합니다 (비거래 시간 보정 포함).
///
/// # 구현 예시
///
/// ```ignore
/// pub struct TwelveDataProvider { /* ... */ }
///
/// #[async_trait]
/// impl CandleProvider for TwelveDataProvider {
///     async fn fetch_candles(&self, ...) -> Result<Vec<Candle>, ProviderError> {
///         // HTTP 호출 및 변환
///     }
/// }
/// ```
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// 캔들 데이터 조회.
    ///
    /// # Arguments
    ///
    /// * `symbol` - 중립 심볼 (예: "XAUUSD")
    /// * `timeframe` - 타임프레임
    /// * `start` - 조회 시작 시각 (None이면 제공자가 결정)
    /// * `end` - 조회 종료 시각 (None이면 현재까지)
    /// * `limit` - 최대 캔들 수
    ///
    /// # Errors
    ///
    /// - `ProviderError::Network`: 전송 실패
    /// - `ProviderError::Api`: 업스트림 에러 응답
    /// - `ProviderError::Parse`: 응답 형식 불일치
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError>;

    /// 제공자 이름 (로깅용).
    fn provider_name(&self) -> &str;
}
