//! 업스트림 API 재시도 유틸리티.
//!
//! 네트워크 오류, 요청 한도 초과 등 일시적인 오류에 대해 자동 재시도를
//! 수행합니다. `ProviderError`의 분류(`is_retryable`/`is_fatal`)를 따르므로
//! 제공자 구현과 무관하게 사용할 수 있습니다.
//!
//! # 예시
//!
//! ```rust,ignore
//! use aurum_exchange::retry::{with_retry, RetryConfig};
//!
//! let config = RetryConfig::default();
//! let result = with_retry(&config, || async {
//!     provider.fetch_candles("XAUUSD", Timeframe::H1, None, None, 100).await
//! }).await;
//! ```

use std::{future::Future, time::Duration};

use tracing::{debug, warn};

use aurum_core::ProviderError;

/// 재시도 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 재시도 횟수 (초기 시도 제외).
    pub max_retries: u32,
    /// 기본 대기 시간 (에러에 지정된 대기 시간이 없을 때 사용).
    pub base_delay: Duration,
    /// 최대 대기 시간.
    pub max_delay: Duration,
    /// 지수 백오프 사용 여부.
    pub use_exponential_backoff: bool,
    /// 백오프 배수 (지수 백오프 시 사용).
    pub backoff_multiplier: f64,
    /// 재시도 시 지터(무작위 지연) 추가 여부.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            use_exponential_backoff: true,
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// 빠른 재시도 설정 (짧은 지연, 적은 재시도).
    pub fn fast() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            use_exponential_backoff: true,
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// 재시도 없음 (단일 시도).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// 대기 시간 계산.
    fn calculate_delay(&self, attempt: u32, error: &ProviderError) -> Duration {
        // 에러에 지정된 대기 시간이 있으면 우선 사용
        let base = error
            .retry_delay_ms()
            .map(Duration::from_millis)
            .unwrap_or(self.base_delay);

        // 지수 백오프 적용
        let delay = if self.use_exponential_backoff && attempt > 0 {
            let multiplier = self.backoff_multiplier.powi(attempt as i32);
            Duration::from_secs_f64(base.as_secs_f64() * multiplier)
        } else {
            base
        };

        // 최대 대기 시간 제한
        let delay = delay.min(self.max_delay);

        // 지터 추가 (±25%)
        if self.add_jitter {
            let jitter_range = delay.as_millis() as f64 * 0.25;
            let jitter = (rand_simple() * 2.0 - 1.0) * jitter_range;
            Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
        } else {
            delay
        }
    }
}

/// 간단한 난수 생성 (0.0 ~ 1.0).
/// 외부 의존성 없이 시스템 시간 기반으로 생성.
fn rand_simple() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos as f64) / (u32::MAX as f64)
}

/// 재시도가 포함된 비동기 작업 실행.
///
/// # Arguments
/// * `config` - 재시도 설정
/// * `operation` - 실행할 비동기 작업
///
/// # Returns
/// * `Ok(T)` - 작업 성공 결과
/// * `Err(ProviderError)` - 모든 재시도 실패 후 마지막 에러
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    let mut total_delay = Duration::ZERO;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        attempts = attempt + 1,
                        total_delay_ms = total_delay.as_millis() as u64,
                        "재시도 후 성공"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                // 치명적 에러는 재시도하지 않음
                if e.is_fatal() {
                    warn!(error = %e, "치명적 에러 발생, 재시도 없이 실패 반환");
                    return Err(e);
                }

                // 재시도 가능한 에러가 아니면 즉시 실패
                if !e.is_retryable() {
                    debug!(error = %e, "재시도 불가능한 에러, 즉시 실패 반환");
                    return Err(e);
                }

                // 최대 재시도 횟수 초과
                if attempt >= config.max_retries {
                    warn!(
                        error = %e,
                        attempts = attempt + 1,
                        max_retries = config.max_retries,
                        "최대 재시도 횟수 초과"
                    );
                    return Err(e);
                }

                // 대기 시간 계산 및 대기
                let delay = config.calculate_delay(attempt, &e);
                total_delay += delay;

                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "재시도 대기 중"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
