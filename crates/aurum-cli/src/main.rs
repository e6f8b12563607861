//! Aurum 전략 리서치 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # XAUUSD 1시간봉 백테스트 (캐시 미보유 구간만 업스트림 조회)
//! aurum backtest -s XAUUSD -i 1h -f 2024-01-01 -t 2024-06-30 --strategy golden_momentum
//!
//! # 파라미터 오버라이드
//! aurum backtest -s XAUUSD -i 1h --strategy ma_cross \
//!     --params '{"short_window": 20, "long_window": 60}'
//!
//! # 캐시 커버리지 확인
//! aurum cache-stats
//! ```

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{backtest::run_backtest, cache_stats::run_cache_stats};
use config::AurumConfig;

#[derive(Parser)]
#[command(name = "aurum")]
#[command(about = "Aurum - 트레이딩 전략 리서치 도구", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 과거 캔들로 전략 백테스트 실행
    Backtest {
        /// 심볼 (예: XAUUSD, EUR_USD)
        #[arg(short, long)]
        symbol: String,

        /// 타임프레임 (1m/5m/15m/30m/1h/4h/1d/1w)
        #[arg(short = 'i', long, default_value = "1h")]
        timeframe: String,

        /// 시작 날짜 (YYYY-MM-DD 또는 "YYYY-MM-DD HH:MM:SS")
        #[arg(short = 'f', long)]
        from: Option<String>,

        /// 종료 날짜 (YYYY-MM-DD 또는 "YYYY-MM-DD HH:MM:SS")
        #[arg(short = 't', long)]
        to: Option<String>,

        /// 전략 이름 (ma_cross, golden_momentum)
        #[arg(long, default_value = "ma_cross")]
        strategy: String,

        /// 전략 파라미터 (JSON 객체)
        #[arg(long)]
        params: Option<String>,

        /// 최대 캔들 수
        #[arg(long, default_value_t = 10_000)]
        limit: usize,
    },

    /// 캐시된 캔들 커버리지와 메트릭 출력
    CacheStats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = AurumConfig::from_env()?;

    match cli.command {
        Commands::Backtest {
            symbol,
            timeframe,
            from,
            to,
            strategy,
            params,
            limit,
        } => {
            info!(symbol = %symbol, timeframe = %timeframe, strategy = %strategy, "백테스트 시작");
            run_backtest(&config, symbol, timeframe, from, to, strategy, params, limit).await
        }
        Commands::CacheStats => run_cache_stats(&config).await,
    }
}
