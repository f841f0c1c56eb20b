//! 수집 오케스트레이터 -- 업로드 파일을 저장된 체크리스트로 만드는 전체 흐름
//!
//! # 새 업로드 (`ingest_new`)
//! ```text
//! 파일마다 순서대로:
//!   classify -> (convert | 원문) -> sanitize -> normalize -> stamp
//!     -> [첫 저장 직전에 한 번] resolve group
//!     -> add -> publish checklist.save.new -> publish system.count.add -> flush
//! ```
//!
//! # 업데이트 (`ingest_update`)
//! ```text
//! classify -> get existing -> (merge | 원문) -> sanitize -> normalize
//!   -> 이전 문서의 소유자/그룹 유지 -> replace -> publish checklist.save.update -> flush
//! ```
//!
//! 배치는 트랜잭션이 아닙니다. 중간 파일이 실패해도 앞서 저장된 파일은 남습니다.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use stigpost_core::event::{
    EventPublisher, TOPIC_CHECKLIST_SAVE_NEW, TOPIC_CHECKLIST_SAVE_UPDATE, TOPIC_SYSTEM_COUNT_ADD,
};
use stigpost_core::metrics as m;
use stigpost_core::store::{ArtifactStore, SystemGroupStore};
use stigpost_core::types::{ActorId, Artifact, SystemGroup};
use tracing::{debug, info, warn};

use crate::classifier::{FileKind, FileTypeClassifier};
use crate::config::{BatchPolicy, IngestorConfig};
use crate::error::IngestError;
use crate::normalizer::ChecklistNormalizer;
use crate::resolver::SystemGroupResolver;
use crate::sanitize::sanitize;
use crate::scap::{ScanAdapter, XccdfScanAdapter};

const FLOW_NEW: &str = "new";
const FLOW_UPDATE: &str = "update";

/// 업로드된 파일 한 건
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 클라이언트가 보낸 파일명
    pub filename: String,
    /// 파일 내용
    pub content: Bytes,
}

impl UploadedFile {
    /// 새 업로드 파일을 생성합니다.
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// 내용을 UTF-8 텍스트로 읽습니다. 앞의 BOM은 제거합니다.
    fn text(&self) -> Result<String, IngestError> {
        let text = std::str::from_utf8(&self.content)
            .map_err(|e| IngestError::parse(self.filename.clone(), e))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_owned())
    }
}

/// 실패한 파일 한 건
#[derive(Debug)]
pub struct FileFailure {
    /// 파일명
    pub filename: String,
    /// 실패 원인
    pub error: IngestError,
}

/// 배치 업로드 결과
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// 연결된 시스템 그룹 ID (저장된 파일이 없으면 `None`)
    pub system_group_id: Option<String>,
    /// 저장된 문서 ID (처리 순서)
    pub persisted: Vec<String>,
    /// 건너뛴 파일 (`ContinueOnError`에서만 채워짐)
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    /// 모든 파일이 저장되었는지 확인합니다.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 체크리스트 수집기
///
/// 저장소와 발행자는 `Arc`로 공유되며 내부적으로 동기화됩니다.
/// 수집기 자체는 잠금을 사용하지 않습니다.
pub struct ChecklistIngestor<S, P, A = XccdfScanAdapter>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
    A: ScanAdapter,
{
    config: IngestorConfig,
    classifier: FileTypeClassifier,
    normalizer: ChecklistNormalizer,
    adapter: A,
    store: Arc<S>,
    resolver: SystemGroupResolver<S>,
    publisher: Arc<P>,
}

impl<S, P, A> ChecklistIngestor<S, P, A>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
    A: ScanAdapter,
{
    /// 수집기 설정
    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }

    /// 공유 저장소
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 공유 발행자
    pub fn publisher(&self) -> &Arc<P> {
        &self.publisher
    }

    /// 새 체크리스트 파일들을 저장합니다.
    ///
    /// 그룹은 첫 저장 직전에 한 번만 해석됩니다. 첫 파일이 거부되면 아무것도
    /// 기록되지 않습니다.
    ///
    /// # Errors
    ///
    /// - 파일이 없으면 `IngestError::EmptyBatch`
    /// - `AbortOnError`에서는 첫 번째 파일 에러
    pub async fn ingest_new(
        &self,
        files: Vec<UploadedFile>,
        group_id: Option<&str>,
        requested_title: &str,
        actor: Option<ActorId>,
    ) -> Result<BatchOutcome, IngestError> {
        if files.is_empty() {
            return Err(IngestError::EmptyBatch);
        }

        let total = files.len();
        let mut group: Option<SystemGroup> = None;
        let mut outcome = BatchOutcome::default();

        for file in files {
            let started = Instant::now();
            let result = self
                .ingest_one(&file, &mut group, group_id, requested_title, actor)
                .await;
            record_duration(FLOW_NEW, started);

            match result {
                Ok(id) => outcome.persisted.push(id),
                Err(e) => {
                    record_error(&e);
                    warn!(
                        filename = %file.filename,
                        error = %e,
                        kind = e.kind(),
                        persisted = outcome.persisted.len(),
                        "checklist file rejected"
                    );
                    match self.config.batch_policy {
                        BatchPolicy::AbortOnError => return Err(e),
                        BatchPolicy::ContinueOnError => outcome.failures.push(FileFailure {
                            filename: file.filename,
                            error: e,
                        }),
                    }
                }
            }
        }

        outcome.system_group_id = group.map(|g| g.id);
        info!(
            files = total,
            persisted = outcome.persisted.len(),
            failed = outcome.failures.len(),
            system_group_id = outcome.system_group_id.as_deref().unwrap_or(""),
            "checklist batch processed"
        );
        Ok(outcome)
    }

    async fn ingest_one(
        &self,
        file: &UploadedFile,
        group: &mut Option<SystemGroup>,
        group_id: Option<&str>,
        requested_title: &str,
        actor: Option<ActorId>,
    ) -> Result<String, IngestError> {
        let kind = self.classifier.classify(&file.filename)?;
        self.check_size(file)?;

        let text = file.text()?;
        let checklist = match kind {
            FileKind::RawChecklist => text,
            FileKind::ScanResult => self.adapter.convert(&text)?,
        };
        let sanitized = sanitize(&checklist);
        let mut artifact = self.normalizer.normalize(&sanitized)?.into_artifact(sanitized);
        artifact.created_by = actor;

        let linked = match group.take() {
            Some(existing) => existing,
            None => {
                self.resolver
                    .resolve(group_id, requested_title, actor)
                    .await?
                    .group
            }
        };
        artifact.link_system_group(&linked);
        *group = Some(linked);

        let stored = self.store.add_artifact(artifact).await?;
        metrics::counter!(m::INGEST_FILES_TOTAL, m::LABEL_FILE_KIND => kind.label()).increment(1);
        info!(
            artifact_id = %stored.id,
            filename = %file.filename,
            kind = %kind,
            host_name = %stored.host_name,
            stig_type = %stored.stig_type,
            system_group_id = %stored.system_group_id,
            "checklist stored"
        );

        self.publisher
            .publish(TOPIC_CHECKLIST_SAVE_NEW, Bytes::from(stored.id.clone()))
            .await?;
        self.publisher
            .publish(TOPIC_SYSTEM_COUNT_ADD, Bytes::from(stored.system_group_id.clone()))
            .await?;
        self.publisher.flush().await?;

        Ok(stored.id)
    }

    /// 기존 체크리스트를 새 파일로 교체합니다.
    ///
    /// 이전 문서의 작성자와 그룹 연결은 유지되며 요청의 `group_id`는 무시됩니다.
    /// 실패하면 이전 문서는 그대로 남습니다.
    ///
    /// # Errors
    ///
    /// 대상 문서가 없으면 `IngestError::ArtifactNotFound`, 그 외 처리 단계의 에러
    pub async fn ingest_update(
        &self,
        id: &str,
        file: UploadedFile,
        group_id: Option<&str>,
        actor: Option<ActorId>,
    ) -> Result<Artifact, IngestError> {
        let started = Instant::now();
        let result = self.update_one(id, &file, group_id, actor).await;
        record_duration(FLOW_UPDATE, started);

        result.inspect_err(|e| {
            record_error(e);
            warn!(
                artifact_id = id,
                filename = %file.filename,
                error = %e,
                kind = e.kind(),
                "checklist update rejected"
            );
        })
    }

    async fn update_one(
        &self,
        id: &str,
        file: &UploadedFile,
        group_id: Option<&str>,
        actor: Option<ActorId>,
    ) -> Result<Artifact, IngestError> {
        if let Some(group_id) = group_id.filter(|g| !g.trim().is_empty()) {
            debug!(artifact_id = id, system_group_id = group_id, "group id ignored on update");
        }

        let kind = self.classifier.classify(&file.filename)?;
        self.check_size(file)?;
        let text = file.text()?;

        let existing = self
            .store
            .get_artifact(id)
            .await?
            .ok_or_else(|| IngestError::ArtifactNotFound(id.to_owned()))?;

        let checklist = match kind {
            FileKind::RawChecklist => text,
            FileKind::ScanResult => self.adapter.merge(&text, &existing.raw_checklist, false)?,
        };
        let sanitized = sanitize(&checklist);
        let mut artifact = self.normalizer.normalize(&sanitized)?.into_artifact(sanitized);

        if existing.created_by.is_some() {
            artifact.created_by = existing.created_by;
        }
        // 작성자 기록과 무관하게 그룹 연결 유지 (문서는 항상 하나의 그룹에 속함)
        if !existing.system_group_id.is_empty() {
            artifact.system_group_id = existing.system_group_id;
            artifact.system_title = existing.system_title;
        }
        artifact.updated_by = actor;
        artifact.updated_on = Some(Utc::now());
        artifact.id = id.to_owned();

        if !self.store.replace_artifact(id, artifact.clone()).await? {
            return Err(IngestError::ArtifactNotFound(id.to_owned()));
        }
        metrics::counter!(m::INGEST_FILES_TOTAL, m::LABEL_FILE_KIND => kind.label()).increment(1);
        info!(
            artifact_id = id,
            filename = %file.filename,
            kind = %kind,
            host_name = %artifact.host_name,
            stig_type = %artifact.stig_type,
            "checklist replaced"
        );

        self.publisher
            .publish(TOPIC_CHECKLIST_SAVE_UPDATE, Bytes::from(id.to_owned()))
            .await?;
        self.publisher.flush().await?;

        Ok(artifact)
    }

    fn check_size(&self, file: &UploadedFile) -> Result<(), IngestError> {
        let size = file.content.len();
        if size > self.config.max_file_bytes {
            return Err(IngestError::FileTooLarge {
                filename: file.filename.clone(),
                size,
                max: self.config.max_file_bytes,
            });
        }
        Ok(())
    }
}

fn record_error(err: &IngestError) {
    metrics::counter!(m::INGEST_ERRORS_TOTAL, m::LABEL_ERROR_KIND => err.kind()).increment(1);
}

fn record_duration(flow: &'static str, started: Instant) {
    metrics::histogram!(m::INGEST_FILE_DURATION_SECONDS, m::LABEL_FLOW => flow)
        .record(started.elapsed().as_secs_f64());
}

/// 수집기 빌더
///
/// ```
/// use std::sync::Arc;
/// use stigpost_checklist_ingest::{ChannelPublisher, ChecklistIngestorBuilder, MemoryStore};
///
/// let (publisher, _events) = ChannelPublisher::new(16, "");
/// let ingestor = ChecklistIngestorBuilder::new(Arc::new(MemoryStore::new()), Arc::new(publisher))
///     .build()
///     .unwrap();
/// # let _ = ingestor;
/// ```
pub struct ChecklistIngestorBuilder<S, P, A = XccdfScanAdapter> {
    config: IngestorConfig,
    store: Arc<S>,
    publisher: Arc<P>,
    adapter: A,
}

impl<S, P> ChecklistIngestorBuilder<S, P, XccdfScanAdapter>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    /// 저장소와 발행자로 빌더를 생성합니다. 어댑터는 [`XccdfScanAdapter`]가 기본입니다.
    pub fn new(store: Arc<S>, publisher: Arc<P>) -> Self {
        Self {
            config: IngestorConfig::default(),
            store,
            publisher,
            adapter: XccdfScanAdapter::new(),
        }
    }
}

impl<S, P, A> ChecklistIngestorBuilder<S, P, A>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
    A: ScanAdapter,
{
    /// 수집기 설정을 지정합니다.
    pub fn config(mut self, config: IngestorConfig) -> Self {
        self.config = config;
        self
    }

    /// 스캔 결과 어댑터를 교체합니다.
    pub fn adapter<B: ScanAdapter>(self, adapter: B) -> ChecklistIngestorBuilder<S, P, B> {
        ChecklistIngestorBuilder {
            config: self.config,
            store: self.store,
            publisher: self.publisher,
            adapter,
        }
    }

    /// 수집기를 빌드합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증에 실패하면 `IngestError::Config`
    pub fn build(self) -> Result<ChecklistIngestor<S, P, A>, IngestError> {
        self.config.validate()?;

        Ok(ChecklistIngestor {
            config: self.config,
            classifier: FileTypeClassifier::new(),
            normalizer: ChecklistNormalizer::new(),
            adapter: self.adapter,
            resolver: SystemGroupResolver::new(Arc::clone(&self.store)),
            store: self.store,
            publisher: self.publisher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::ChannelPublisher;
    use crate::store::MemoryStore;
    use stigpost_core::event::PublishedEvent;
    use tokio::sync::mpsc;

    const CKL: &str = "<?xml version=\"1.0\"?>\n<CHECKLIST>\n\t<ASSET>\n\t\t<HOST_NAME>web01</HOST_NAME>\n\t</ASSET>\n\t<STIGS><iSTIG><STIG_INFO>\
<SI_DATA><SID_NAME>title</SID_NAME><SID_DATA>Windows Server 2016 Security Technical Implementation Guide</SID_DATA></SI_DATA>\
<SI_DATA><SID_NAME>releaseinfo</SID_NAME><SID_DATA>Release: 8 Benchmark Date: 26 Apr 2019</SID_DATA></SI_DATA>\
</STIG_INFO></iSTIG></STIGS>\n</CHECKLIST>";

    type TestIngestor = ChecklistIngestor<MemoryStore, ChannelPublisher>;

    fn ingestor(policy: BatchPolicy) -> (TestIngestor, mpsc::Receiver<PublishedEvent>) {
        let (publisher, rx) = ChannelPublisher::new(64, "");
        let ingestor = ChecklistIngestorBuilder::new(Arc::new(MemoryStore::new()), Arc::new(publisher))
            .config(IngestorConfig {
                batch_policy: policy,
                ..IngestorConfig::default()
            })
            .build()
            .unwrap();
        (ingestor, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<PublishedEvent>) -> Vec<(String, String)> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push((event.topic.clone(), event.payload_text()));
        }
        events
    }

    #[tokio::test]
    async fn single_checklist_is_stored_and_announced() {
        let (ingestor, mut rx) = ingestor(BatchPolicy::AbortOnError);

        let outcome = ingestor
            .ingest_new(vec![UploadedFile::new("web01.ckl", CKL)], None, "Finance", None)
            .await
            .unwrap();

        assert_eq!(outcome.persisted.len(), 1);
        let id = &outcome.persisted[0];
        let group_id = outcome.system_group_id.clone().unwrap();

        let stored = ingestor.store().get_artifact(id).await.unwrap().unwrap();
        assert_eq!(stored.host_name, "web01");
        assert_eq!(stored.stig_type, "WIN SVR 2016 STIG");
        assert_eq!(stored.stig_release, "R8 dated 26 Apr 2019");
        assert_eq!(stored.system_title, "Finance");
        assert!(!stored.raw_checklist.contains('\t'));

        assert_eq!(
            drain(&mut rx),
            vec![
                ("checklist.save.new".to_owned(), id.clone()),
                ("system.count.add".to_owned(), group_id),
            ]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let (ingestor, _rx) = ingestor(BatchPolicy::AbortOnError);
        let err = ingestor.ingest_new(vec![], None, "", None).await.unwrap_err();
        assert!(matches!(err, IngestError::EmptyBatch));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let (publisher, _rx) = ChannelPublisher::new(8, "");
        let ingestor = ChecklistIngestorBuilder::new(Arc::new(MemoryStore::new()), Arc::new(publisher))
            .config(IngestorConfig {
                max_file_bytes: 16,
                ..IngestorConfig::default()
            })
            .build()
            .unwrap();

        let err = ingestor
            .ingest_new(vec![UploadedFile::new("a.ckl", CKL)], None, "", None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::FileTooLarge { max: 16, .. }));
        assert_eq!(ingestor.store().group_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_parse_error() {
        let (ingestor, _rx) = ingestor(BatchPolicy::AbortOnError);
        let err = ingestor
            .ingest_new(
                vec![UploadedFile::new("a.ckl", vec![0xff_u8, 0xfe, 0x00])],
                None,
                "",
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[tokio::test]
    async fn bom_is_stripped() {
        let (ingestor, _rx) = ingestor(BatchPolicy::AbortOnError);
        let content = format!("\u{feff}{CKL}");
        let outcome = ingestor
            .ingest_new(vec![UploadedFile::new("a.ckl", content)], None, "", None)
            .await
            .unwrap();
        let stored = ingestor
            .store()
            .get_artifact(&outcome.persisted[0])
            .await
            .unwrap()
            .unwrap();
        assert!(stored.raw_checklist.starts_with("<?xml"));
    }

    #[tokio::test]
    async fn continue_policy_collects_failures() {
        let (ingestor, mut rx) = ingestor(BatchPolicy::ContinueOnError);

        let outcome = ingestor
            .ingest_new(
                vec![
                    UploadedFile::new("notes.txt", "hello"),
                    UploadedFile::new("a.ckl", CKL),
                    UploadedFile::new("broken.ckl", "<CHECKLIST>"),
                    UploadedFile::new("b.ckl", CKL),
                ],
                None,
                "",
                None,
            )
            .await
            .unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(outcome.persisted.len(), 2);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].error.kind(), "unsupported_file_type");
        assert_eq!(outcome.failures[1].filename, "broken.ckl");
        assert_eq!(drain(&mut rx).len(), 4);
        assert_eq!(ingestor.store().group_count().await, 1);
    }

    #[tokio::test]
    async fn anonymous_checklist_keeps_group_on_update() {
        let (ingestor, _rx) = ingestor(BatchPolicy::AbortOnError);
        let outcome = ingestor
            .ingest_new(vec![UploadedFile::new("a.ckl", CKL)], None, "Alpha", None)
            .await
            .unwrap();
        let id = &outcome.persisted[0];

        let updater: ActorId = "6f1c0a52-3b8e-4d7e-9a51-0c2f4b1e9d77".parse().unwrap();
        let updated = ingestor
            .ingest_update(id, UploadedFile::new("a.ckl", CKL), Some("other"), Some(updater))
            .await
            .unwrap();

        assert_eq!(updated.created_by, None);
        assert_eq!(updated.updated_by, Some(updater));
        assert_eq!(Some(updated.system_group_id.clone()), outcome.system_group_id);
        assert_eq!(updated.system_title, "Alpha");
    }

    #[tokio::test]
    async fn update_with_replace_all_false_is_used_for_scans() {
        struct RecordingAdapter(std::sync::Mutex<Vec<bool>>);

        impl ScanAdapter for RecordingAdapter {
            fn convert(&self, _scan_xml: &str) -> Result<String, IngestError> {
                Ok(CKL.to_owned())
            }

            fn merge(
                &self,
                _scan_xml: &str,
                existing: &str,
                replace_all: bool,
            ) -> Result<String, IngestError> {
                if let Ok(mut calls) = self.0.lock() {
                    calls.push(replace_all);
                }
                Ok(existing.to_owned())
            }
        }

        let (publisher, _rx) = ChannelPublisher::new(8, "");
        let ingestor = ChecklistIngestorBuilder::new(Arc::new(MemoryStore::new()), Arc::new(publisher))
            .adapter(RecordingAdapter(std::sync::Mutex::new(Vec::new())))
            .build()
            .unwrap();

        let outcome = ingestor
            .ingest_new(vec![UploadedFile::new("scan.xml", "<x/>")], None, "", None)
            .await
            .unwrap();
        ingestor
            .ingest_update(&outcome.persisted[0], UploadedFile::new("scan.xml", "<x/>"), None, None)
            .await
            .unwrap();

        assert_eq!(*ingestor.adapter.0.lock().unwrap(), vec![false]);
    }
}
