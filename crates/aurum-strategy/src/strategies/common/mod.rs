//! 전략 공용 유틸리티.

pub mod indicators;
