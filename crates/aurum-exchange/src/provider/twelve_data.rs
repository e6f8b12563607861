//! Twelve Data REST API 클라이언트.
//!
//! `/time_series` 엔드포인트에서 캔들 데이터를 조회합니다.
//!
//! # API 특성
//!
//! - 심볼은 슬래시 구분 형식 ("XAU/USD")
//! - 타임프레임은 자체 코드 ("1min", "1h", "1day")
//! - 응답 캔들은 시간 내림차순 → 오름차순으로 뒤집어 반환
//! - 가격/거래량은 문자열로 인코딩됨
//! - 무료 플랜은 분당 8회 요청 제한 → `RateLimiter`로 간격 유지
//!
//! 날짜 범위 기반 조회이므로 `end`만 주어진 요청은 비거래 시간
//! (주말/공휴일)을 보정한 1.5배 버퍼로 합성 `start`를 계산합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use aurum_core::{Candle, CandleProvider, ProviderError, Timeframe};

use crate::rate_limit::RateLimiter;
use crate::retry::{with_retry, RetryConfig};

/// outputsize 파라미터 상한 (Twelve Data API 제한).
const MAX_OUTPUT_SIZE: usize = 5000;

// =============================================================================
// 설정
// =============================================================================

/// Twelve Data 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct TwelveDataConfig {
    /// API 키
    pub api_key: String,
    /// API 베이스 URL (테스트에서 mock 서버로 교체)
    pub base_url: String,
    /// 요청 간 최소 간격 (무료 플랜: 8초)
    pub min_request_interval: Duration,
    /// 일시적 오류 재시도 설정
    pub retry: RetryConfig,
}

impl TwelveDataConfig {
    /// API 키로 기본 설정 생성.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.twelvedata.com".to_string(),
            min_request_interval: Duration::from_secs(8),
            retry: RetryConfig::default(),
        }
    }

    /// 베이스 URL 설정.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// 요청 간 최소 간격 설정.
    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// 재시도 설정 변경.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// =============================================================================
// 응답 타입
// =============================================================================

/// /time_series 응답.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    /// "ok" 또는 "error"
    status: Option<String>,
    /// 에러 코드 (에러 응답에만 존재)
    code: Option<i64>,
    /// 에러 메시지 (에러 응답에만 존재)
    message: Option<String>,
    /// 캔들 행 (시간 내림차순)
    values: Option<Vec<TimeSeriesRow>>,
}

/// 캔들 한 행. 모든 수치는 문자열로 인코딩됨.
#[derive(Debug, Deserialize)]
struct TimeSeriesRow {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

// =============================================================================
// Provider
// =============================================================================

/// Twelve Data 캔들 데이터 제공자.
pub struct TwelveDataProvider {
    config: TwelveDataConfig,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl TwelveDataProvider {
    /// 새 클라이언트 생성.
    pub fn new(config: TwelveDataConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.min_request_interval);
        Self {
            config,
            client: reqwest::Client::new(),
            rate_limiter,
        }
    }

    /// 중립 심볼을 Twelve Data 형식으로 변환.
    ///
    /// "XAUUSD" → "XAU/USD", "EUR_USD" → "EUR/USD".
    fn convert_symbol(symbol: &str) -> String {
        if symbol == "XAUUSD" {
            return "XAU/USD".to_string();
        }
        symbol.replace('_', "/")
    }

    /// 타임프레임을 Twelve Data interval 코드로 변환.
    fn convert_interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::M1 => "1min",
            Timeframe::M5 => "5min",
            Timeframe::M15 => "15min",
            Timeframe::M30 => "30min",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1day",
            Timeframe::W1 => "1week",
        }
    }

    /// end만 주어진 요청의 합성 start 계산.
    ///
    /// 날짜 범위 기반 API에서 `limit`개 이상의 캔들을 확보하기 위해
    /// `interval × limit × 1.5` 만큼 과거로 거슬러 올라갑니다.
    /// 1.5배 버퍼는 주말/공휴일 등 비거래 구간을 보정합니다.
    fn synthetic_start(end: DateTime<Utc>, timeframe: Timeframe, limit: usize) -> DateTime<Utc> {
        let span = timeframe.duration() * (limit as i32);
        end - (span + span / 2)
    }

    /// 단일 API 호출 실행 (재시도 없음).
    async fn fetch_once(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let td_symbol = Self::convert_symbol(symbol);
        let td_interval = Self::convert_interval(timeframe);

        self.rate_limiter.acquire().await;

        // end만 주어진 경우 limit개 확보를 위한 합성 start 계산
        let start = match (start, end) {
            (None, Some(end)) => {
                let synthetic = Self::synthetic_start(end, timeframe, limit);
                debug!(
                    symbol = symbol,
                    start = %synthetic,
                    end = %end,
                    limit = limit,
                    "합성 start 계산"
                );
                Some(synthetic)
            }
            (start, _) => start,
        };

        let mut params: Vec<(&str, String)> = vec![
            ("symbol", td_symbol.clone()),
            ("interval", td_interval.to_string()),
            ("apikey", self.config.api_key.clone()),
            ("format", "JSON".to_string()),
            ("outputsize", limit.min(MAX_OUTPUT_SIZE).to_string()),
        ];
        if let Some(start) = start {
            params.push(("start_date", start.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        if let Some(end) = end {
            params.push(("end_date", end.format("%Y-%m-%d %H:%M:%S").to_string()));
        }

        let url = format!("{}/time_series", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "HTTP {} - {}",
                status.as_u16(),
                body
            )));
        }

        let payload: TimeSeriesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("응답 본문 파싱 실패: {}", e)))?;

        // 2xx 본문에 포함된 에러 페이로드 확인
        if payload.status.as_deref() == Some("error") {
            let message = payload.message.unwrap_or_else(|| "알 수 없는 오류".to_string());
            return Err(match payload.code {
                Some(401) => ProviderError::Authentication(message),
                Some(429) => ProviderError::RateLimited(message),
                _ => ProviderError::Api(message),
            });
        }

        let values = payload.values.unwrap_or_default();

        // 시간 내림차순 응답을 오름차순으로 변환하며 파싱.
        // 한 행이라도 실패하면 전체 호출 실패 (부분 성공 없음).
        let mut candles = Vec::with_capacity(values.len());
        for row in values.iter().rev() {
            candles.push(Self::parse_row(row, symbol, timeframe)?);
        }

        debug!(
            symbol = symbol,
            interval = td_interval,
            count = candles.len(),
            "업스트림 캔들 수신"
        );

        Ok(candles)
    }

    /// 응답 행 하나를 캔들로 변환.
    fn parse_row(
        row: &TimeSeriesRow,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Candle, ProviderError> {
        let open_time = Self::parse_datetime(&row.datetime)?;

        let parse_price = |field: &str, value: &str| -> Result<Decimal, ProviderError> {
            value.parse::<Decimal>().map_err(|e| {
                ProviderError::Parse(format!("{} 파싱 실패 ({}): {}", field, value, e))
            })
        };

        let volume = match row.volume.as_deref() {
            Some(v) => v
                .parse::<f64>()
                .map_err(|e| ProviderError::Parse(format!("volume 파싱 실패 ({}): {}", v, e)))?
                as i64,
            None => 0,
        };

        Ok(Candle::new(
            symbol,
            timeframe,
            open_time,
            parse_price("open", &row.open)?,
            parse_price("high", &row.high)?,
            parse_price("low", &row.low)?,
            parse_price("close", &row.close)?,
            volume,
        ))
    }

    /// datetime 필드 파싱.
    ///
    /// 분봉/시간봉은 "2024-01-05 13:00:00", 일봉 이상은 "2024-01-05" 형식.
    fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ProviderError> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(dt.and_utc());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| d.and_hms_opt(0, 0, 0).expect("자정은 항상 유효").and_utc())
            .map_err(|e| ProviderError::Parse(format!("datetime 파싱 실패 ({}): {}", s, e)))
    }
}

#[async_trait]
impl CandleProvider for TwelveDataProvider {
    #[instrument(skip(self), fields(provider = "twelve_data"))]
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        with_retry(&self.config.retry, || {
            self.fetch_once(symbol, timeframe, start, end, limit)
        })
        .await
    }

    fn provider_name(&self) -> &str {
        "twelve_data"
    }
}

// =============================================================================
// 테스트
// =============================================================================
