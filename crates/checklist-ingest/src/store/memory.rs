//! 메모리 저장소
//!
//! 프로세스가 종료되면 내용이 사라집니다. 테스트와 단일 인스턴스 실행용입니다.

use std::collections::HashMap;
use std::future::Future;

use stigpost_core::error::StoreError;
use stigpost_core::store::{ArtifactStore, SystemGroupStore};
use stigpost_core::types::{Artifact, SystemGroup};
use tokio::sync::RwLock;

use super::new_id;

/// `RwLock<HashMap>` 기반 메모리 저장소
#[derive(Default)]
pub struct MemoryStore {
    artifacts: RwLock<HashMap<String, Artifact>>,
    groups: RwLock<HashMap<String, SystemGroup>>,
}

impl MemoryStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 문서 수
    pub async fn artifact_count(&self) -> usize {
        self.artifacts.read().await.len()
    }

    /// 저장된 그룹 수
    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }

    /// 모든 그룹을 반환합니다.
    pub async fn list_system_groups(&self) -> Vec<SystemGroup> {
        self.groups.read().await.values().cloned().collect()
    }
}

impl ArtifactStore for MemoryStore {
    fn get_artifact(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Artifact>, StoreError>> + Send {
        async move { Ok(self.artifacts.read().await.get(id).cloned()) }
    }

    fn add_artifact(
        &self,
        mut artifact: Artifact,
    ) -> impl Future<Output = Result<Artifact, StoreError>> + Send {
        async move {
            artifact.id = new_id();
            self.artifacts
                .write()
                .await
                .insert(artifact.id.clone(), artifact.clone());
            Ok(artifact)
        }
    }

    fn replace_artifact(
        &self,
        id: &str,
        mut artifact: Artifact,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move {
            let mut artifacts = self.artifacts.write().await;
            match artifacts.get_mut(id) {
                Some(slot) => {
                    artifact.id = id.to_owned();
                    *slot = artifact;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn delete_artifact(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move { Ok(self.artifacts.write().await.remove(id).is_some()) }
    }

    fn list_artifacts(&self) -> impl Future<Output = Result<Vec<Artifact>, StoreError>> + Send {
        async move { Ok(self.artifacts.read().await.values().cloned().collect()) }
    }
}

impl SystemGroupStore for MemoryStore {
    fn get_system_group(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<SystemGroup>, StoreError>> + Send {
        async move { Ok(self.groups.read().await.get(id).cloned()) }
    }

    fn add_system_group(
        &self,
        mut group: SystemGroup,
    ) -> impl Future<Output = Result<SystemGroup, StoreError>> + Send {
        async move {
            group.id = new_id();
            self.groups
                .write()
                .await
                .insert(group.id.clone(), group.clone());
            Ok(group)
        }
    }

    fn update_system_group(
        &self,
        id: &str,
        mut group: SystemGroup,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move {
            let mut groups = self.groups.write().await;
            match groups.get_mut(id) {
                Some(slot) => {
                    group.id = id.to_owned();
                    *slot = group;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.add_artifact(Artifact::new("<A/>")).await.unwrap();
        let b = store.add_artifact(Artifact::new("<B/>")).await.unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(store.artifact_count().await, 2);
    }

    #[tokio::test]
    async fn add_ignores_caller_id() {
        let store = MemoryStore::new();
        let mut artifact = Artifact::new("<A/>");
        artifact.id = "chosen".to_owned();
        let stored = store.add_artifact(artifact).await.unwrap();
        assert_ne!(stored.id, "chosen");
    }

    #[tokio::test]
    async fn replace_keeps_id_and_swaps_document() {
        let store = MemoryStore::new();
        let stored = store.add_artifact(Artifact::new("<A/>")).await.unwrap();

        let mut next = Artifact::new("<B/>");
        next.host_name = "db01".to_owned();
        assert!(store.replace_artifact(&stored.id, next).await.unwrap());

        let fetched = store.get_artifact(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.raw_checklist, "<B/>");
        assert_eq!(fetched.host_name, "db01");
    }

    #[tokio::test]
    async fn replace_missing_returns_false() {
        let store = MemoryStore::new();
        assert!(!store
            .replace_artifact("missing", Artifact::new("<A/>"))
            .await
            .unwrap());
        assert_eq!(store.artifact_count().await, 0);
    }

    #[tokio::test]
    async fn delete_and_list() {
        let store = MemoryStore::new();
        let a = store.add_artifact(Artifact::new("<A/>")).await.unwrap();
        store.add_artifact(Artifact::new("<B/>")).await.unwrap();

        assert!(store.delete_artifact(&a.id).await.unwrap());
        assert!(!store.delete_artifact(&a.id).await.unwrap());
        assert_eq!(store.list_artifacts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn group_add_get_update() {
        let store = MemoryStore::new();
        let group = store
            .add_system_group(SystemGroup::new("Ops", None))
            .await
            .unwrap();

        let mut renamed = group.clone();
        renamed.title = "Ops-2".to_owned();
        assert!(store.update_system_group(&group.id, renamed).await.unwrap());
        assert_eq!(
            store.get_system_group(&group.id).await.unwrap().unwrap().title,
            "Ops-2"
        );
        assert!(!store
            .update_system_group("missing", SystemGroup::new("x", None))
            .await
            .unwrap());
        assert_eq!(store.group_count().await, 1);
    }
}
