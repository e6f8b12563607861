//! 캔들(OHLCV)과 타임프레임 타입.
//!
//! 데이터 소스마다 다른 캔들 표현(Twelve Data, OANDA 등)을
//! 통일된 형식으로 표현하기 위한 중립 타입입니다.
//!
//! # 불변 조건
//!
//! 캔들은 (symbol, timeframe, open_time) 기준으로 유일하며,
//! 저장된 이후에는 수정되지 않습니다. 중복 저장은 저장 계층에서
//! conflict-skip으로 흡수됩니다.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Timeframe
// =============================================================================

/// 캔들 타임프레임.
///
/// 직렬화 형식은 짧은 코드("1m", "1h", "1d")를 사용하며,
/// 파싱 시에는 MT 스타일 코드("M1", "H1", "D")도 허용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1분봉
    #[serde(rename = "1m")]
    M1,
    /// 5분봉
    #[serde(rename = "5m")]
    M5,
    /// 15분봉
    #[serde(rename = "15m")]
    M15,
    /// 30분봉
    #[serde(rename = "30m")]
    M30,
    /// 1시간봉
    #[serde(rename = "1h")]
    H1,
    /// 4시간봉
    #[serde(rename = "4h")]
    H4,
    /// 일봉
    #[serde(rename = "1d")]
    D1,
    /// 주봉
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    /// 타임프레임의 공칭 간격.
    ///
    /// 갭 감지 임계값 계산과 합성 start 계산에 사용됩니다.
    /// 비거래 시간(주말/공휴일)은 고려하지 않습니다.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::M30 => Duration::minutes(30),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
            Timeframe::W1 => Duration::weeks(1),
        }
    }

    /// DB 저장용 문자열 코드.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    /// 짧은 코드와 MT 스타일 코드 모두 파싱.
    ///
    /// "1h" == "H1", "1d" == "D" == "D1" 등.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" | "M1" => Ok(Timeframe::M1),
            "5m" | "M5" => Ok(Timeframe::M5),
            "15m" | "M15" => Ok(Timeframe::M15),
            "30m" | "M30" => Ok(Timeframe::M30),
            "1h" | "H1" => Ok(Timeframe::H1),
            "4h" | "H4" => Ok(Timeframe::H4),
            "1d" | "D" | "D1" => Ok(Timeframe::D1),
            "1w" | "W" | "W1" => Ok(Timeframe::W1),
            other => Err(format!("알 수 없는 타임프레임: {}", other)),
        }
    }
}

// =============================================================================
// Candle
// =============================================================================

/// 데이터 소스 중립 OHLCV 캔들.
///
/// 가격은 `Decimal`, 거래량은 정수로 표현합니다.
/// `open_time`은 캔들 구간의 시작 시각(UTC)입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 심볼 (예: "XAUUSD", "EUR_USD")
    pub symbol: String,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 캔들 시작 시각 (UTC)
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: i64,
}

impl Candle {
    /// 새 캔들 생성.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 캔들 구간의 종료 시각.
    pub fn close_time(&self) -> DateTime<Utc> {
        self.open_time + self.timeframe.duration()
    }
}

// =============================================================================
// 테스트
// =============================================================================
