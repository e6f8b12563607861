//! 시뮬레이션 분석 크레이트.
//!
//! 확정된 캔들 시퀀스를 한 번에 하나씩 리플레이하며 전략을 실행하는
//! 결정적 시뮬레이션 엔진과 성과 리포트를 제공합니다.

pub mod backtest;

pub use backtest::{
    SimulationConfig, SimulationEngine, SimulationError, SimulationReport, SimulationResult,
};
