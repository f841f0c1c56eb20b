//! 도메인 타입 -- 체크리스트 문서와 시스템 그룹
//!
//! 모든 모듈이 공유하는 데이터 구조를 정의합니다.
//! 소유권/감사 필드는 "미설정" 센티널 값 대신 `Option`으로 표현합니다.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HOST_NAME이 없거나 비어 있을 때 사용하는 기본 호스트명
pub const UNKNOWN_HOST: &str = "Unknown-Host";

/// 요청된 그룹 제목이 없거나 그룹 ID가 유효하지 않을 때 사용하는 기본 제목
pub const DEFAULT_SYSTEM_TITLE: &str = "None";

/// 요청을 보낸 사용자 식별자
///
/// 상위 인증 프록시가 전달한 사용자 ID(UUID)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

impl ActorId {
    /// UUID로 ActorId를 생성합니다.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// 내부 UUID를 반환합니다.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 저장된 체크리스트 문서
///
/// `raw_checklist`가 원본이며, 나머지 메타데이터 필드는 모두 여기에서 파생됩니다.
/// 업데이트 시 문서 전체가 교체됩니다 (필드 단위 패치 없음).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// 저장소가 생성 시 할당하는 ID (이후 불변)
    #[serde(default)]
    pub id: String,
    /// 정제된 CKL XML 원문
    pub raw_checklist: String,
    /// ASSET 섹션의 HOST_NAME
    pub host_name: String,
    /// 약어 처리된 STIG 제목
    pub stig_type: String,
    /// 약어 처리된 STIG 릴리스 정보
    pub stig_release: String,
    /// 소속 시스템 그룹 ID
    pub system_group_id: String,
    /// 마지막 기록 시점의 시스템 그룹 제목 (캐시)
    pub system_title: String,
    /// 최초 업로드 사용자
    pub created_by: Option<ActorId>,
    /// 생성 시각
    pub created: DateTime<Utc>,
    /// 마지막 업데이트 사용자
    pub updated_by: Option<ActorId>,
    /// 마지막 업데이트 시각
    pub updated_on: Option<DateTime<Utc>>,
}

impl Artifact {
    /// 정제된 체크리스트 원문으로 새 문서를 생성합니다.
    ///
    /// `created`/`updated_on`은 현재 시각, 호스트명은 기본값으로 설정됩니다.
    pub fn new(raw_checklist: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            raw_checklist: raw_checklist.into(),
            host_name: UNKNOWN_HOST.to_owned(),
            stig_type: String::new(),
            stig_release: String::new(),
            system_group_id: String::new(),
            system_title: String::new(),
            created_by: None,
            created: now,
            updated_by: None,
            updated_on: Some(now),
        }
    }

    /// 시스템 그룹 링크를 설정합니다.
    pub fn link_system_group(&mut self, group: &SystemGroup) {
        self.system_group_id = group.id.clone();
        self.system_title = group.title.clone();
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Artifact[{}] host={} type={} release={} system={}",
            self.id, self.host_name, self.stig_type, self.stig_release, self.system_title,
        )
    }
}

/// 시스템 그룹: 하나의 평가 대상 시스템에 속한 체크리스트 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemGroup {
    /// 저장소가 생성 시 할당하는 ID
    #[serde(default)]
    pub id: String,
    /// 그룹 제목
    pub title: String,
    /// 생성 사용자
    pub created_by: Option<ActorId>,
    /// 생성 시각
    pub created: DateTime<Utc>,
    /// 마지막 업데이트 사용자
    pub updated_by: Option<ActorId>,
    /// 마지막 업데이트 시각
    pub updated_on: Option<DateTime<Utc>>,
}

impl SystemGroup {
    /// 새 그룹을 생성합니다. 제목이 비어 있으면 기본 제목을 사용합니다.
    pub fn new(title: &str, created_by: Option<ActorId>) -> Self {
        let title = if title.trim().is_empty() {
            DEFAULT_SYSTEM_TITLE
        } else {
            title
        };
        Self {
            id: String::new(),
            title: title.to_owned(),
            created_by,
            created: Utc::now(),
            updated_by: None,
            updated_on: None,
        }
    }

    /// 사용자 소유권을 기록합니다.
    ///
    /// `created_by`가 비어 있으면 채우고, 이미 있으면 `updated_by`에 기록합니다.
    pub fn stamp_actor(&mut self, actor: ActorId) {
        match self.created_by {
            None => self.created_by = Some(actor),
            Some(_) => self.updated_by = Some(actor),
        }
    }
}

/// 컴포넌트 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 일부 기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}
