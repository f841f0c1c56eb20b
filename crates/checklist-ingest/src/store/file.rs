//! JSON 파일 저장소
//!
//! 문서 하나당 JSON 파일 하나를 씁니다.
//!
//! ```text
//! {root}/
//! ├── artifacts/{id}.json
//! └── systems/{id}.json
//! ```
//!
//! 쓰기는 임시 파일에 기록한 뒤 rename으로 교체하므로 실패해도 기존 파일은
//! 그대로 남습니다. 쓰기 작업은 저장소 단위 잠금으로 직렬화됩니다.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use stigpost_core::error::StoreError;
use stigpost_core::store::{ArtifactStore, SystemGroupStore};
use stigpost_core::types::{Artifact, SystemGroup};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::new_id;

const ARTIFACTS_DIR: &str = "artifacts";
const SYSTEMS_DIR: &str = "systems";
const EXTENSION: &str = "json";

/// 디렉토리 기반 JSON 저장소
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// 저장소 디렉토리를 열고, 없으면 생성합니다.
    ///
    /// # Errors
    ///
    /// 디렉토리를 만들 수 없으면 `StoreError::Connection`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for dir in [ARTIFACTS_DIR, SYSTEMS_DIR] {
            let path = root.join(dir);
            tokio::fs::create_dir_all(&path).await.map_err(|e| {
                StoreError::Connection(format!("failed to create {}: {e}", path.display()))
            })?;
        }
        debug!(root = %root.display(), "file store opened");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// 저장소 루트 경로
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 문서 경로. ID가 파일명으로 안전하지 않으면 `None`.
    fn document_path(&self, dir: &str, id: &str) -> Option<PathBuf> {
        is_safe_id(id).then(|| self.root.join(dir).join(format!("{id}.{EXTENSION}")))
    }

    async fn read<T: DeserializeOwned>(&self, dir: &str, id: &str) -> Result<Option<T>, StoreError> {
        let Some(path) = self.document_path(dir, id) else {
            return Ok(None);
        };
        read_document(&path).await
    }

    async fn insert<T: Serialize>(&self, dir: &str, id: &str, doc: &T) -> Result<(), StoreError> {
        let path = self
            .document_path(dir, id)
            .ok_or_else(|| StoreError::Query(format!("invalid id: {id}")))?;
        let _guard = self.write_lock.lock().await;
        write_document(&path, doc).await
    }

    async fn replace<T: Serialize>(&self, dir: &str, id: &str, doc: &T) -> Result<bool, StoreError> {
        let Some(path) = self.document_path(dir, id) else {
            return Ok(false);
        };
        let _guard = self.write_lock.lock().await;
        if !exists(&path).await? {
            return Ok(false);
        }
        write_document(&path, doc).await?;
        Ok(true)
    }
}

impl ArtifactStore for FileStore {
    fn get_artifact(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Artifact>, StoreError>> + Send {
        self.read(ARTIFACTS_DIR, id)
    }

    fn add_artifact(
        &self,
        mut artifact: Artifact,
    ) -> impl Future<Output = Result<Artifact, StoreError>> + Send {
        async move {
            artifact.id = new_id();
            self.insert(ARTIFACTS_DIR, &artifact.id, &artifact).await?;
            Ok(artifact)
        }
    }

    fn replace_artifact(
        &self,
        id: &str,
        mut artifact: Artifact,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move {
            artifact.id = id.to_owned();
            self.replace(ARTIFACTS_DIR, id, &artifact).await
        }
    }

    fn delete_artifact(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move {
            let Some(path) = self.document_path(ARTIFACTS_DIR, id) else {
                return Ok(false);
            };
            let _guard = self.write_lock.lock().await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(StoreError::Query(format!(
                    "failed to delete {}: {e}",
                    path.display()
                ))),
            }
        }
    }

    fn list_artifacts(&self) -> impl Future<Output = Result<Vec<Artifact>, StoreError>> + Send {
        async move {
            let dir = self.root.join(ARTIFACTS_DIR);
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
                StoreError::Query(format!("failed to read {}: {e}", dir.display()))
            })?;

            let mut artifacts = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::Query(format!("failed to read directory entry: {e}")))?
            {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                    continue;
                }
                match read_document::<Artifact>(&path).await {
                    Ok(Some(artifact)) => artifacts.push(artifact),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
                    }
                }
            }
            Ok(artifacts)
        }
    }
}

impl SystemGroupStore for FileStore {
    fn get_system_group(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<SystemGroup>, StoreError>> + Send {
        self.read(SYSTEMS_DIR, id)
    }

    fn add_system_group(
        &self,
        mut group: SystemGroup,
    ) -> impl Future<Output = Result<SystemGroup, StoreError>> + Send {
        async move {
            group.id = new_id();
            self.insert(SYSTEMS_DIR, &group.id, &group).await?;
            Ok(group)
        }
    }

    fn update_system_group(
        &self,
        id: &str,
        mut group: SystemGroup,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move {
            group.id = id.to_owned();
            self.replace(SYSTEMS_DIR, id, &group).await
        }
    }
}

/// ID가 파일명 한 조각으로만 쓰이는지 확인합니다.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn exists(path: &Path) -> Result<bool, StoreError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| StoreError::Query(format!("failed to stat {}: {e}", path.display())))
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::Query(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Codec(format!("{}: {e}", path.display())))
}

/// 임시 파일에 기록한 뒤 rename합니다.
async fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Codec(e.to_string()))?;

    let tmp = path.with_extension(format!("{EXTENSION}.tmp-{}", new_id()));
    if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::Query(format!(
            "failed to write {}: {e}",
            tmp.display()
        )));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::Query(format!(
            "failed to rename into {}: {e}",
            path.display()
        )));
    }
    Ok(())
}
