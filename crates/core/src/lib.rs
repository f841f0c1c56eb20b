//! Stigpost 공통 크레이트 -- 도메인 타입, 협력자 trait, 에러, 설정
//!
//! # 모듈 구성
//!
//! - [`types`]: 체크리스트 문서([`Artifact`]), 시스템 그룹([`SystemGroup`]), 사용자 ID
//! - [`store`]: 저장소 trait ([`ArtifactStore`], [`SystemGroupStore`])
//! - [`event`]: 이벤트 발행 trait ([`EventPublisher`])과 토픽 상수
//! - [`error`]: 도메인별 에러
//! - [`config`]: `stigpost.toml` 설정
//! - [`metrics`]: Prometheus 메트릭 이름

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod store;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, PublishError, StigpostError, StoreError};

// 설정
pub use config::StigpostConfig;

// 이벤트
pub use event::{EventPublisher, PublishedEvent};

// 저장소 trait
pub use store::{ArtifactStore, SystemGroupStore};

// 도메인 타입
pub use types::{ActorId, Artifact, HealthStatus, SystemGroup};
