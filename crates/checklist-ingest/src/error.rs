//! 체크리스트 수집 에러 타입
//!
//! [`IngestError`]는 수집 파이프라인 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! HTTP 경계에서는 종류와 상관없이 하나의 클라이언트 에러로 응답하고,
//! 구분 정보는 [`IngestError::kind`]로 로그와 메트릭에만 남깁니다.
//!
//! # 에러 카테고리
//!
//! - **입력**: `UnsupportedFileType`, `FileTooLarge`, `EmptyBatch`, `InvalidActor`
//! - **파싱**: `Parse`
//! - **협력자**: `GroupResolution`, `Store`, `Publish`, `ArtifactNotFound`
//! - **설정**: `Config`

use stigpost_core::error::{ConfigError, PublishError, StigpostError, StoreError};

/// 체크리스트 수집 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 지원하지 않는 파일 확장자
    #[error("unsupported file type: {filename}")]
    UnsupportedFileType {
        /// 업로드된 파일명
        filename: String,
    },

    /// 체크리스트 또는 스캔 결과 XML 파싱 실패
    #[error("parse error: {source_name}: {reason}")]
    Parse {
        /// 파싱 대상 (파일명 또는 문서 종류)
        source_name: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 파일 크기 초과
    #[error("file too large: {filename}: {size} bytes (max: {max})")]
    FileTooLarge {
        /// 파일명
        filename: String,
        /// 실제 크기 (바이트)
        size: usize,
        /// 최대 허용 크기 (바이트)
        max: usize,
    },

    /// 업로드 요청에 파일이 없음
    #[error("no checklist files in request")]
    EmptyBatch,

    /// 사용자 ID 형식 오류
    #[error("invalid actor id: {0}")]
    InvalidActor(String),

    /// 시스템 그룹 조회/생성/갱신 실패
    #[error("system group resolution failed: {0}")]
    GroupResolution(#[source] StoreError),

    /// 체크리스트 문서 저장소 실패
    #[error("artifact store error: {0}")]
    Store(#[from] StoreError),

    /// 업데이트 대상 문서가 없음
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// 이벤트 발행 실패
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// 수집기 설정 오류
    #[error("config error: {0}")]
    Config(String),
}

impl IngestError {
    /// 파싱 에러를 생성합니다.
    pub fn parse(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// 로그/메트릭 레이블용 에러 종류 이름을 반환합니다.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType { .. } => "unsupported_file_type",
            Self::Parse { .. } => "parse",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::EmptyBatch => "empty_batch",
            Self::InvalidActor(_) => "invalid_actor",
            Self::GroupResolution(_) => "group_resolution",
            Self::Store(_) => "store",
            Self::ArtifactNotFound(_) => "artifact_not_found",
            Self::Publish(_) => "publish",
            Self::Config(_) => "config",
        }
    }
}

impl From<IngestError> for StigpostError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::GroupResolution(e) | IngestError::Store(e) => StigpostError::Storage(e),
            IngestError::Publish(e) => StigpostError::Publish(e),
            IngestError::Config(reason) => StigpostError::Config(ConfigError::InvalidValue {
                field: "ingest".to_owned(),
                reason,
            }),
            other => StigpostError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                other.to_string(),
            )),
        }
    }
}
