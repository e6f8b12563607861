//! 데이터 계층 에러 타입.

use aurum_core::ProviderError;
use thiserror::Error;

/// 데이터 계층 에러.
#[derive(Debug, Error)]
pub enum DataError {
    /// DB 연결 실패
    #[error("DB 연결 실패: {0}")]
    ConnectionError(String),

    /// 조회 쿼리 실패
    #[error("조회 실패: {0}")]
    QueryError(String),

    /// 저장 쿼리 실패
    #[error("저장 실패: {0}")]
    InsertError(String),

    /// 삭제 쿼리 실패
    #[error("삭제 실패: {0}")]
    DeleteError(String),

    /// 업스트림 조회 실패.
    ///
    /// 요청 구간 전체가 비어 있고 유일한 갭의 fetch가 실패한 경우에만
    /// 호출자에게 전파됩니다. 부분 실패는 캐시된 데이터 반환으로 흡수됩니다.
    #[error("업스트림 조회 실패: {0}")]
    Upstream(#[from] ProviderError),
}

/// 데이터 계층 결과 타입.
pub type Result<T> = std::result::Result<T, DataError>;
