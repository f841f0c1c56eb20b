//! 수집기 설정
//!
//! [`IngestorConfig`]는 core의 [`IngestConfig`](stigpost_core::config::IngestConfig)
//! 문자열 값을 타입으로 옮긴 것입니다.
//!
//! ```
//! use stigpost_checklist_ingest::{BatchPolicy, IngestorConfig};
//!
//! let config = IngestorConfig::default();
//! assert_eq!(config.batch_policy, BatchPolicy::AbortOnError);
//! config.validate().unwrap();
//! ```

use std::fmt;

use crate::error::IngestError;

/// 배치 업로드 중 파일 하나가 실패했을 때의 처리 방식
///
/// 어느 쪽이든 이미 저장된 파일은 되돌리지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// 첫 실패에서 중단하고 에러를 반환합니다.
    #[default]
    AbortOnError,
    /// 실패한 파일을 기록하고 나머지 파일을 계속 처리합니다.
    ContinueOnError,
}

impl BatchPolicy {
    /// 설정 문자열에서 변환합니다 (`abort`, `continue`). 대소문자 무시.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "abort_on_error" => Some(Self::AbortOnError),
            "continue" | "continue_on_error" => Some(Self::ContinueOnError),
            _ => None,
        }
    }
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbortOnError => f.write_str("abort"),
            Self::ContinueOnError => f.write_str("continue"),
        }
    }
}

/// 파일 크기 상한
const MAX_FILE_BYTES_LIMIT: usize = 512 * 1024 * 1024; // 512MB

/// 수집기 설정
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// 배치 실패 정책
    pub batch_policy: BatchPolicy,
    /// 파일 한 건의 최대 크기 (바이트)
    pub max_file_bytes: usize,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            batch_policy: BatchPolicy::AbortOnError,
            max_file_bytes: 32 * 1024 * 1024,
        }
    }
}

impl IngestorConfig {
    /// core 설정에서 생성합니다. 알 수 없는 정책 문자열은 기본값을 사용합니다.
    pub fn from_core(core: &stigpost_core::config::IngestConfig) -> Self {
        Self {
            batch_policy: BatchPolicy::from_str_loose(&core.batch_policy).unwrap_or_default(),
            max_file_bytes: core.max_file_bytes,
        }
    }

    /// 설정 값을 검증합니다.
    ///
    /// `max_file_bytes`는 1..=512MB
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_file_bytes == 0 || self.max_file_bytes > MAX_FILE_BYTES_LIMIT {
            return Err(IngestError::Config(format!(
                "max_file_bytes must be between 1 and {MAX_FILE_BYTES_LIMIT}, got {}",
                self.max_file_bytes
            )));
        }
        Ok(())
    }
}
