//! 데이터베이스 연결 관리.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::{DataError, Result};

/// 캔들 테이블 스키마.
///
/// (symbol, timeframe, open_time) 복합 기본 키가 유일성을 보장하며,
/// conflict-skip 삽입의 기준이 됩니다.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS candles (
    symbol     TEXT        NOT NULL,
    timeframe  TEXT        NOT NULL,
    open_time  TIMESTAMPTZ NOT NULL,
    open       NUMERIC     NOT NULL,
    high       NUMERIC     NOT NULL,
    low        NUMERIC     NOT NULL,
    close      NUMERIC     NOT NULL,
    volume     BIGINT      NOT NULL DEFAULT 0,
    fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (symbol, timeframe, open_time)
)
"#;

/// 데이터베이스 설정.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 연결 URL (예: "postgres://localhost/aurum")
    pub url: String,
    /// 커넥션 풀 최대 크기
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// URL로 기본 설정 생성.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
        }
    }

    /// 커넥션 풀 크기 설정.
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// 데이터베이스 연결 핸들.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스에 연결.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!(max_connections = config.max_connections, "DB 연결 완료");
        Ok(Self { pool })
    }

    /// 커넥션 풀 반환.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 스키마 생성 (멱등).
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;
        Ok(())
    }
}
