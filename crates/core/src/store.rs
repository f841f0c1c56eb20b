//! 저장소 trait -- 체크리스트 문서와 시스템 그룹의 영속화 계약
//!
//! 수집 파이프라인은 저장소 엔진을 직접 알지 못하고 이 trait만 사용합니다.
//! 구현체는 내부적으로 동기화되어야 하며(`Send + Sync`), 파이프라인은
//! 별도의 잠금을 수행하지 않습니다.
//!
//! ID는 저장소가 할당하는 불투명 문자열입니다.

use std::future::Future;

use crate::error::StoreError;
use crate::types::{Artifact, SystemGroup};

/// 체크리스트 문서 저장소
pub trait ArtifactStore: Send + Sync + 'static {
    /// ID로 문서를 조회합니다. 없으면 `None`.
    fn get_artifact(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Artifact>, StoreError>> + Send;

    /// 새 문서를 저장하고 ID가 할당된 문서를 반환합니다.
    ///
    /// 입력 문서의 `id`는 무시됩니다.
    fn add_artifact(
        &self,
        artifact: Artifact,
    ) -> impl Future<Output = Result<Artifact, StoreError>> + Send;

    /// 같은 ID의 문서를 통째로 교체합니다.
    ///
    /// 교체는 원자적이어야 합니다. 실패 시 기존 문서는 그대로 남습니다.
    /// 대상 문서가 없으면 `Ok(false)`.
    fn replace_artifact(
        &self,
        id: &str,
        artifact: Artifact,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// 문서를 삭제합니다. 대상이 없으면 `Ok(false)`.
    fn delete_artifact(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// 모든 문서를 반환합니다.
    fn list_artifacts(&self) -> impl Future<Output = Result<Vec<Artifact>, StoreError>> + Send;
}

/// 시스템 그룹 저장소
pub trait SystemGroupStore: Send + Sync + 'static {
    /// ID로 그룹을 조회합니다. 없으면 `None`.
    fn get_system_group(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<SystemGroup>, StoreError>> + Send;

    /// 새 그룹을 저장하고 ID가 할당된 그룹을 반환합니다.
    fn add_system_group(
        &self,
        group: SystemGroup,
    ) -> impl Future<Output = Result<SystemGroup, StoreError>> + Send;

    /// 그룹을 교체합니다. 대상이 없으면 `Ok(false)`.
    fn update_system_group(
        &self,
        id: &str,
        group: SystemGroup,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
