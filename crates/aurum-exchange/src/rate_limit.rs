//! 업스트림 API 요청 간격 제한기.
//!
//! Twelve Data 무료 플랜은 분당 8회 요청을 허용하므로, 요청 사이에
//! 최소 간격(기본 8초)을 강제합니다. 토큰 버킷이 아닌 최소 간격
//! 방식이므로 버스트 허용량은 항상 1입니다.
//!
//! # 동작 방식
//!
//! `acquire()`는 이 인스턴스가 마지막으로 허가한 시점부터 최소 간격이
//! 지날 때까지 호출자를 suspend합니다. 경쟁하는 호출자는 내부 Mutex
//! 순서대로 직렬화되며, 각 호출자는 자신의 호출 시점이 아니라
//! *직전 허가* 시점 기준의 남은 쿨다운만 기다립니다.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// 최소 간격 기반 요청 제한기.
///
/// 업스트림 연결당 하나의 전역 인스턴스를 공유합니다.
#[derive(Debug)]
pub struct RateLimiter {
    /// 요청 간 최소 간격
    min_interval: Duration,
    /// 마지막 허가 시점 (아직 허가한 적 없으면 None)
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 지정된 최소 간격으로 제한기 생성.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    /// 설정된 최소 간격.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 요청 허가 대기.
    ///
    /// 마지막 허가 이후 최소 간격이 지나지 않았으면 남은 시간만큼
    /// suspend합니다. Mutex를 대기 동안 유지하므로 동시 호출자는
    /// 허가 순서대로 정확히 간격을 두고 진행합니다.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "요청 간격 대기");
                sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
