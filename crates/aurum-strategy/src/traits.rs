//! Strategy trait 정의.

use async_trait::async_trait;

use aurum_core::{Candle, OrderIntent};

/// 전략 훅 에러 타입.
pub type StrategyError = Box<dyn std::error::Error + Send + Sync>;

/// 트레이딩 전략 구현을 위한 Strategy trait.
///
/// 시뮬레이션 엔진은 리플레이 시작 시 `on_start`, 캔들마다 `on_candle`,
/// 종료 시 `on_end`를 호출합니다. 훅에서 에러가 발생하면 리플레이 전체가
/// 중단됩니다 (상태를 알 수 없는 전략으로 계속 진행하지 않음).
#[async_trait]
pub trait Strategy: Send + Sync {
    /// 전략 이름 반환.
    fn name(&self) -> &str;

    /// 전략 설명 반환.
    fn description(&self) -> &str;

    /// 리플레이 시작 시 호출. 내부 상태를 초기화합니다.
    async fn on_start(&mut self) -> Result<(), StrategyError> {
        Ok(())
    }

    /// 새 캔들 수신 시 호출.
    ///
    /// 반환한 의도는 순서대로, 해당 캔들의 종가에 체결됩니다.
    /// 수량이 0 이하인 의도는 엔진이 건너뜁니다.
    async fn on_candle(&mut self, candle: &Candle) -> Result<Vec<OrderIntent>, StrategyError>;

    /// 리플레이 종료 시 호출. 리소스 정리용.
    async fn on_end(&mut self) -> Result<(), StrategyError> {
        Ok(())
    }
}
