//! 내장 전략 구현.
//!
//! 모든 전략은 [`Strategy`](crate::Strategy) trait를 구현하며,
//! serde 기본값이 있는 설정 구조체로 파라미터를 받습니다.

pub mod common;
pub mod golden_momentum;
pub mod ma_cross;

use serde_json::Value;
use thiserror::Error;

use crate::Strategy;

pub use golden_momentum::{GoldenMomentumConfig, GoldenMomentumStrategy};
pub use ma_cross::{MaCrossConfig, MaCrossStrategy};

/// 전략 생성 에러.
#[derive(Debug, Error)]
pub enum StrategyBuildError {
    /// 등록되지 않은 전략 이름
    #[error("알 수 없는 전략: {0}")]
    UnknownStrategy(String),

    /// 파라미터 역직렬화 실패
    #[error("전략 파라미터 오류: {0}")]
    InvalidParams(String),
}

/// 이름과 파라미터로 전략 인스턴스 생성.
///
/// 파라미터는 JSON 객체이며, 생략된 필드는 전략별 기본값을 사용합니다.
///
/// # 등록된 전략
///
/// - `"ma_cross"`: 이동평균 크로스오버
/// - `"golden_momentum"`: EMA 추세 + RSI 눌림목 모멘텀 (롱 전용)
pub fn build_strategy(name: &str, params: Value) -> Result<Box<dyn Strategy>, StrategyBuildError> {
    match name {
        "ma_cross" => {
            let config: MaCrossConfig = serde_json::from_value(params)
                .map_err(|e| StrategyBuildError::InvalidParams(e.to_string()))?;
            Ok(Box::new(MaCrossStrategy::new(config)))
        }
        "golden_momentum" => {
            let config: GoldenMomentumConfig = serde_json::from_value(params)
                .map_err(|e| StrategyBuildError::InvalidParams(e.to_string()))?;
            Ok(Box::new(GoldenMomentumStrategy::new(config)))
        }
        other => Err(StrategyBuildError::UnknownStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_registered_strategies() {
        let ma = build_strategy("ma_cross", json!({})).unwrap();
        assert_eq!(ma.name(), "ma_cross");

        let gm = build_strategy("golden_momentum", json!({ "rsi_period": 7 })).unwrap();
        assert_eq!(gm.name(), "golden_momentum");
    }

    #[test]
    fn test_build_unknown_strategy_fails() {
        let result = build_strategy("does_not_exist", json!({}));
        assert!(matches!(
            result,
            Err(StrategyBuildError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_build_with_bad_params_fails() {
        let result = build_strategy("ma_cross", json!({ "short_window": "ten" }));
        assert!(matches!(result, Err(StrategyBuildError::InvalidParams(_))));
    }
}
