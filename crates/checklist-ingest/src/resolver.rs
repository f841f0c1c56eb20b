//! 시스템 그룹 해석 -- 조회, 지연 생성, 소유권 기록
//!
//! 업로드 요청의 그룹 ID와 제목으로 체크리스트가 연결될 그룹을 정합니다.
//!
//! | 입력 | 결과 |
//! |------|------|
//! | ID 없음/빈 문자열 | 요청 제목(없으면 `"None"`)으로 새 그룹 |
//! | ID 있음, 저장소에 없음 | `"None"` 제목으로 새 그룹 (요청 제목 무시) |
//! | ID 있음, 저장소에 있음 | `updated_on` 갱신, 사용자 기록 후 저장 |
//!
//! 같은 제목으로 동시에 생성 요청이 오면 중복 그룹이 생길 수 있습니다.

use std::sync::Arc;

use chrono::Utc;
use stigpost_core::metrics as m;
use stigpost_core::store::SystemGroupStore;
use stigpost_core::types::{ActorId, DEFAULT_SYSTEM_TITLE, SystemGroup};
use tracing::{debug, info, warn};

use crate::error::IngestError;

/// 해석 결과
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    /// 연결할 그룹 (ID 할당됨)
    pub group: SystemGroup,
    /// 이번 호출에서 새로 만들어졌는지 여부
    pub is_new: bool,
}

/// 시스템 그룹 해석기
pub struct SystemGroupResolver<S: SystemGroupStore> {
    store: Arc<S>,
}

impl<S: SystemGroupStore> SystemGroupResolver<S> {
    /// 그룹 저장소로 해석기를 생성합니다.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 업로드 요청의 그룹을 해석합니다.
    ///
    /// # Errors
    ///
    /// 저장소 호출이 실패하면 `IngestError::GroupResolution`
    pub async fn resolve(
        &self,
        group_id: Option<&str>,
        requested_title: &str,
        actor: Option<ActorId>,
    ) -> Result<ResolvedGroup, IngestError> {
        let group_id = group_id.map(str::trim).filter(|id| !id.is_empty());

        let Some(id) = group_id else {
            return self.create(requested_title, actor).await;
        };

        let existing = self
            .store
            .get_system_group(id)
            .await
            .map_err(IngestError::GroupResolution)?;

        match existing {
            Some(group) => self.touch(group, actor).await,
            None => {
                warn!(system_group_id = id, "system group not found, creating default group");
                self.create(DEFAULT_SYSTEM_TITLE, actor).await
            }
        }
    }

    async fn create(
        &self,
        title: &str,
        actor: Option<ActorId>,
    ) -> Result<ResolvedGroup, IngestError> {
        let group = self
            .store
            .add_system_group(SystemGroup::new(title, actor))
            .await
            .map_err(IngestError::GroupResolution)?;

        metrics::counter!(m::SYSTEM_GROUPS_CREATED_TOTAL).increment(1);
        info!(
            system_group_id = %group.id,
            title = %group.title,
            "system group created"
        );

        Ok(ResolvedGroup {
            group,
            is_new: true,
        })
    }

    async fn touch(
        &self,
        mut group: SystemGroup,
        actor: Option<ActorId>,
    ) -> Result<ResolvedGroup, IngestError> {
        group.updated_on = Some(Utc::now());
        if let Some(actor) = actor {
            group.stamp_actor(actor);
        }

        let id = group.id.clone();
        let updated = self
            .store
            .update_system_group(&id, group.clone())
            .await
            .map_err(IngestError::GroupResolution)?;

        if !updated {
            // get과 update 사이에 삭제된 경우
            warn!(system_group_id = %id, "system group vanished during update");
        }

        debug!(system_group_id = %id, "system group updated");

        Ok(ResolvedGroup {
            group,
            is_new: false,
        })
    }
}
