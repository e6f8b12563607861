//! 시뮬레이션 결과 리포트.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aurum_core::{ClosedTrade, EquityPoint};

/// 시뮬레이션 실행 리포트.
///
/// 리플레이 종료 시점에 한 번 계산되며 이후 수정되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// 총 수익률 (%)
    pub total_return_pct: Decimal,

    /// 최대 낙폭 (%)
    pub max_drawdown_pct: Decimal,

    /// 승률 (0.0 ~ 1.0, 손익 0 거래는 승리 아님)
    pub win_rate: f64,

    /// 완료된 거래 (시간순)
    pub trades: Vec<ClosedTrade>,

    /// 자산 곡선 (캔들당 한 포인트)
    pub equity_curve: Vec<EquityPoint>,

    /// 초기 자본
    pub initial_balance: Decimal,

    /// 최종 잔고 (실현 손익 반영)
    pub final_balance: Decimal,

    /// 처리한 캔들 수
    pub data_points: usize,
}

impl SimulationReport {
    /// 리플레이 결과로부터 리포트 생성.
    pub fn from_replay(
        initial_balance: Decimal,
        final_balance: Decimal,
        trades: Vec<ClosedTrade>,
        equity_curve: Vec<EquityPoint>,
        data_points: usize,
    ) -> Self {
        let total_return_pct =
            (final_balance - initial_balance) / initial_balance * Decimal::from(100);

        Self {
            total_return_pct,
            max_drawdown_pct: max_drawdown_pct(&equity_curve),
            win_rate: win_rate(&trades),
            trades,
            equity_curve,
            initial_balance,
            final_balance,
            data_points,
        }
    }

    /// 빈 리포트 (캔들이 없을 때).
    pub fn empty(initial_balance: Decimal) -> Self {
        Self {
            total_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            win_rate: 0.0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            initial_balance,
            final_balance: initial_balance,
            data_points: 0,
        }
    }

    /// 요약 문자열 반환.
    pub fn summary(&self) -> String {
        format!(
            "시뮬레이션 결과 요약\n\
             ═══════════════════════════════════════\n\
             데이터 포인트: {}\n\
             초기 자본: {}\n\
             최종 잔고: {:.2}\n\
             총 수익률: {:.2}%\n\
             ───────────────────────────────────────\n\
             총 거래: {}\n\
             승률: {:.1}%\n\
             최대 낙폭: {:.2}%\n\
             ═══════════════════════════════════════",
            self.data_points,
            self.initial_balance,
            self.final_balance,
            self.total_return_pct,
            self.trades.len(),
            self.win_rate * 100.0,
            self.max_drawdown_pct,
        )
    }
}

/// 자산 곡선의 최대 낙폭 (%).
///
/// 진행 중 최고점 `M` 대비 낙폭 `(M - equity) / M`의 최대값.
/// 최고점이 0 이하인 구간의 낙폭은 0으로 처리합니다.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> Decimal {
    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        let dd = if peak > Decimal::ZERO {
            (peak - point.equity) / peak
        } else {
            Decimal::ZERO
        };
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd * Decimal::from(100)
}

/// 승률 계산.
///
/// 손익이 양수인 거래만 승리로 집계하며, 거래가 없으면 0.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    wins as f64 / trades.len() as f64
}
