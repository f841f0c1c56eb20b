//! 참조 저장소 구현 -- 메모리, JSON 파일
//!
//! 두 구현 모두 [`ArtifactStore`]와 [`SystemGroupStore`]를 함께 구현하며
//! 내부적으로 동기화되어 있어 `Arc`로 공유할 수 있습니다.
//!
//! [`ArtifactStore`]: stigpost_core::store::ArtifactStore
//! [`SystemGroupStore`]: stigpost_core::store::SystemGroupStore

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// 새 문서/그룹 ID를 생성합니다.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
