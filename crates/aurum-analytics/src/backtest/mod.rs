//! 백테스팅 모듈.
//!
//! # 주요 구성요소
//!
//! - [`SimulationConfig`]: 시뮬레이션 설정 (초기 자본)
//! - [`SimulationEngine`]: 캔들 리플레이 실행 엔진
//! - [`SimulationReport`]: 시뮬레이션 결과 리포트 (수익률, 낙폭, 승률)

pub mod engine;
pub mod report;

pub use engine::{SimulationConfig, SimulationEngine, SimulationError, SimulationResult};
pub use report::SimulationReport;
