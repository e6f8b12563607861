//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use anyhow::Context;

/// CLI 전체 설정.
#[derive(Debug, Clone)]
pub struct AurumConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// Twelve Data API 키
    pub twelve_data_api_key: String,
    /// 업스트림 요청 간 최소 간격
    pub rate_limit_interval: Duration,
}

impl AurumConfig {
    /// 환경 변수에서 설정 로드.
    ///
    /// - `DATABASE_URL` (필수)
    /// - `TWELVE_DATA_API_KEY` (필수)
    /// - `AURUM_RATE_LIMIT_SECS` (선택, 기본 8초)
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL 환경 변수가 필요합니다")?;
        let twelve_data_api_key = std::env::var("TWELVE_DATA_API_KEY")
            .context("TWELVE_DATA_API_KEY 환경 변수가 필요합니다")?;
        let rate_limit_secs = std::env::var("AURUM_RATE_LIMIT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        Ok(Self {
            database_url,
            twelve_data_api_key,
            rate_limit_interval: Duration::from_secs(rate_limit_secs),
        })
    }
}
