//! 에러 타입 -- 도메인별 에러 정의

/// Stigpost 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StigpostError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// 이벤트 발행 에러
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 백엔드 연결/접근 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 쿼리/쓰기 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 문서 직렬화/역직렬화 실패
    #[error("document codec error: {0}")]
    Codec(String),
}

/// 이벤트 발행 에러
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// 채널이 닫혔거나 가득 참
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 버퍼 비우기 실패
    #[error("flush failed: {0}")]
    Flush(String),
}
