//! 설정 관리 -- stigpost.toml 파싱 및 런타임 설정
//!
//! [`StigpostConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`STIGPOST_SERVER_BIND=0.0.0.0:8080` 형식)
//! 3. 설정 파일 (`stigpost.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), stigpost_core::error::StigpostError> {
//! use stigpost_core::config::StigpostConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = StigpostConfig::load("stigpost.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = StigpostConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StigpostError};

/// Stigpost 통합 설정
///
/// `stigpost.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StigpostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// HTTP 수신 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 문서 저장소 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 이벤트 발행 설정
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// 수집 파이프라인 설정
    #[serde(default)]
    pub ingest: IngestConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl StigpostConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StigpostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StigpostError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StigpostError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StigpostError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, StigpostError> {
        toml::from_str(toml_str).map_err(|e| {
            StigpostError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `STIGPOST_{SECTION}_{FIELD}`
    /// 예: `STIGPOST_STORE_BACKEND=file`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STIGPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "STIGPOST_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "STIGPOST_GENERAL_DATA_DIR");

        // Server
        override_string(&mut self.server.bind, "STIGPOST_SERVER_BIND");
        override_usize(
            &mut self.server.max_upload_bytes,
            "STIGPOST_SERVER_MAX_UPLOAD_BYTES",
        );
        override_string(&mut self.server.actor_header, "STIGPOST_SERVER_ACTOR_HEADER");

        // Store
        override_string(&mut self.store.backend, "STIGPOST_STORE_BACKEND");
        override_string(&mut self.store.path, "STIGPOST_STORE_PATH");

        // Publisher
        override_string(
            &mut self.publisher.topic_prefix,
            "STIGPOST_PUBLISHER_TOPIC_PREFIX",
        );
        override_usize(
            &mut self.publisher.channel_capacity,
            "STIGPOST_PUBLISHER_CHANNEL_CAPACITY",
        );

        // Ingest
        override_string(&mut self.ingest.batch_policy, "STIGPOST_INGEST_BATCH_POLICY");
        override_usize(
            &mut self.ingest.max_file_bytes,
            "STIGPOST_INGEST_MAX_FILE_BYTES",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "STIGPOST_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "STIGPOST_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "STIGPOST_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StigpostError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "server.bind",
                format!("'{}' is not a valid socket address", self.server.bind),
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(invalid("server.max_upload_bytes", "must be greater than 0"));
        }

        if self.server.actor_header.trim().is_empty() {
            return Err(invalid("server.actor_header", "must not be empty"));
        }

        let valid_backends = ["memory", "file"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(invalid(
                "store.backend",
                format!("must be one of: {}", valid_backends.join(", ")),
            ));
        }

        if self.store.backend == "file" {
            if self.store.path.is_empty() {
                return Err(invalid(
                    "store.path",
                    "path must not be empty when backend is 'file'",
                ));
            }

            if Path::new(&self.store.path)
                .components()
                .any(|c| c == std::path::Component::ParentDir)
            {
                return Err(invalid(
                    "store.path",
                    "path contains path traversal pattern '..'",
                ));
            }
        }

        if self.publisher.channel_capacity == 0 {
            return Err(invalid(
                "publisher.channel_capacity",
                "must be greater than 0",
            ));
        }

        let valid_policies = ["abort", "continue"];
        if !valid_policies.contains(&self.ingest.batch_policy.as_str()) {
            return Err(invalid(
                "ingest.batch_policy",
                format!("must be one of: {}", valid_policies.join(", ")),
            ));
        }

        if self.ingest.max_file_bytes == 0 {
            return Err(invalid("ingest.max_file_bytes", "must be greater than 0"));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid(
                "metrics.port",
                "port must not be 0 when metrics are enabled",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> StigpostError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/stigpost".to_owned(),
        }
    }
}

/// HTTP 수신 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 수신 주소
    pub bind: String,
    /// 요청 본문 최대 크기 (바이트)
    pub max_upload_bytes: usize,
    /// 인증 프록시가 사용자 ID를 전달하는 헤더명
    pub actor_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_owned(),
            max_upload_bytes: 64 * 1024 * 1024, // 64MB
            actor_header: "x-user-id".to_owned(),
        }
    }
}

/// 문서 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 저장소 백엔드 (memory, file)
    pub backend: String,
    /// file 백엔드의 루트 디렉토리
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_owned(),
            path: "/var/lib/stigpost/store".to_owned(),
        }
    }
}

/// 이벤트 발행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// 토픽 접두어 (예: "openrmf" -> "openrmf.checklist.save.new")
    pub topic_prefix: String,
    /// 프로세스 내 발행 채널 용량
    pub channel_capacity: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            topic_prefix: String::new(),
            channel_capacity: 1024,
        }
    }
}

/// 수집 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 배치 실패 정책 (abort, continue)
    pub batch_policy: String,
    /// 파일 한 건의 최대 크기 (바이트)
    pub max_file_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_policy: "abort".to_owned(),
            max_file_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9102,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}
