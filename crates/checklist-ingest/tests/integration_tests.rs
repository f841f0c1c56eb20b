//! Integration tests for the checklist ingestion pipeline
//!
//! Tests the full flow: upload -> classify -> convert -> sanitize -> normalize
//! -> group resolution -> store -> published events

use std::path::PathBuf;
use std::sync::Arc;

use stigpost_checklist_ingest::{
    BatchPolicy, ChannelPublisher, ChecklistIngestor, ChecklistIngestorBuilder, ChecklistNormalizer,
    FileStore, IngestError, IngestorConfig, MemoryStore, UploadedFile,
};
use stigpost_core::event::PublishedEvent;
use stigpost_core::store::{ArtifactStore, SystemGroupStore};
use stigpost_core::types::{ActorId, SystemGroup};
use tokio::sync::mpsc;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> UploadedFile {
    let content = std::fs::read(fixture_path(name)).unwrap();
    UploadedFile::new(name, content)
}

fn actor(n: u8) -> ActorId {
    format!("7d3f5a10-0000-4000-8000-0000000000{n:02x}")
        .parse()
        .unwrap()
}

struct Harness {
    ingestor: ChecklistIngestor<MemoryStore, ChannelPublisher>,
    store: Arc<MemoryStore>,
    events: mpsc::Receiver<PublishedEvent>,
}

impl Harness {
    fn new(policy: BatchPolicy) -> Self {
        Self::with_prefix(policy, "")
    }

    fn with_prefix(policy: BatchPolicy, prefix: &str) -> Self {
        let store = Arc::new(MemoryStore::new());
        let (publisher, events) = ChannelPublisher::new(128, prefix);
        let ingestor = ChecklistIngestorBuilder::new(Arc::clone(&store), Arc::new(publisher))
            .config(IngestorConfig {
                batch_policy: policy,
                ..IngestorConfig::default()
            })
            .build()
            .unwrap();
        Self {
            ingestor,
            store,
            events,
        }
    }

    fn drain_events(&mut self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push((event.topic.clone(), event.payload_text()));
        }
        out
    }
}

#[test]
fn test_fixture_checklist_normalizes() {
    let raw = std::fs::read_to_string(fixture_path("sample.ckl")).unwrap();
    let sanitized = stigpost_checklist_ingest::sanitize(&raw);
    let normalized = ChecklistNormalizer::new().normalize(&sanitized).unwrap();

    assert_eq!(normalized.host_name, "APP-SRV-01");
    assert_eq!(normalized.stig_type, "WIN SVR 2016 STIG");
    assert_eq!(normalized.stig_release, "R8 dated 26 Apr 2019");
}

#[tokio::test]
async fn test_create_links_new_titled_group_and_publishes_two_events() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(vec![fixture("sample.ckl")], Some(""), "Alpha", Some(actor(1)))
        .await
        .unwrap();

    assert_eq!(h.store.group_count().await, 1);
    assert_eq!(h.store.artifact_count().await, 1);

    let groups = h.store.list_system_groups().await;
    assert_eq!(groups[0].title, "Alpha");
    assert_eq!(groups[0].created_by, Some(actor(1)));

    let artifact = h
        .store
        .get_artifact(&outcome.persisted[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artifact.system_group_id, groups[0].id);
    assert_eq!(artifact.system_title, "Alpha");
    assert_eq!(artifact.host_name, "APP-SRV-01");
    assert_eq!(artifact.created_by, Some(actor(1)));
    assert!(artifact.updated_on.is_some());
    assert!(!artifact.raw_checklist.contains('\t'));
    assert!(!artifact.raw_checklist.contains(">\n<"));

    assert_eq!(
        h.drain_events(),
        vec![
            ("checklist.save.new".to_owned(), artifact.id.clone()),
            ("system.count.add".to_owned(), groups[0].id.clone()),
        ]
    );
}

#[tokio::test]
async fn test_create_with_unknown_group_id_falls_back_to_default_title() {
    let h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(
            vec![fixture("sample.ckl")],
            Some("no-such-group"),
            "Alpha",
            None,
        )
        .await
        .unwrap();

    let groups = h.store.list_system_groups().await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].title, "None");
    assert_eq!(outcome.system_group_id.as_deref(), Some(groups[0].id.as_str()));
}

#[tokio::test]
async fn test_create_with_existing_group_reuses_it() {
    let h = Harness::new(BatchPolicy::AbortOnError);
    let seeded = h
        .store
        .add_system_group(SystemGroup::new("Bravo", Some(actor(1))))
        .await
        .unwrap();

    h.ingestor
        .ingest_new(vec![fixture("sample.ckl")], Some(seeded.id.as_str()), "ignored", Some(actor(2)))
        .await
        .unwrap();

    assert_eq!(h.store.group_count().await, 1);
    let group = h.store.get_system_group(&seeded.id).await.unwrap().unwrap();
    assert_eq!(group.title, "Bravo");
    assert_eq!(group.created_by, Some(actor(1)));
    assert_eq!(group.updated_by, Some(actor(2)));
    assert!(group.updated_on.is_some());
}

#[tokio::test]
async fn test_batch_shares_one_group_and_counts_each_file() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(
            vec![fixture("sample.ckl"), fixture("xccdf-results.xml")],
            None,
            "Charlie",
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.persisted.len(), 2);
    assert_eq!(h.store.group_count().await, 1);

    let group_id = outcome.system_group_id.unwrap();
    let topics: Vec<_> = h.drain_events();
    assert_eq!(topics.len(), 4);
    assert_eq!(topics[1], ("system.count.add".to_owned(), group_id.clone()));
    assert_eq!(topics[3], ("system.count.add".to_owned(), group_id));
}

#[tokio::test]
async fn test_scan_result_is_converted_on_create() {
    let h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(vec![fixture("xccdf-results.xml")], None, "", None)
        .await
        .unwrap();

    let artifact = h
        .store
        .get_artifact(&outcome.persisted[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artifact.host_name, "APP-SRV-01");
    assert_eq!(artifact.stig_type, "WIN SVR 2016 STIG");
    assert_eq!(artifact.stig_release, "R8 dated 26 Apr 2019");
    assert!(artifact.raw_checklist.contains("<CHECKLIST>"));
    assert!(artifact.raw_checklist.contains("<STATUS>Not_Applicable</STATUS>"));
}

#[tokio::test]
async fn test_unsupported_extension_writes_nothing() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let err = h
        .ingestor
        .ingest_new(
            vec![UploadedFile::new("scan.txt", "plain text")],
            None,
            "Alpha",
            Some(actor(1)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFileType { .. }));
    assert_eq!(h.store.artifact_count().await, 0);
    assert_eq!(h.store.group_count().await, 0);
    assert!(h.drain_events().is_empty());
}

#[tokio::test]
async fn test_batch_with_malformed_second_file_keeps_first() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let err = h
        .ingestor
        .ingest_new(
            vec![fixture("sample.ckl"), fixture("malformed.ckl")],
            None,
            "Delta",
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Parse { .. }));
    assert_eq!(h.store.artifact_count().await, 1);
    assert_eq!(h.store.group_count().await, 1);

    let events = h.drain_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, "checklist.save.new");
    assert_eq!(events[1].0, "system.count.add");
}

#[tokio::test]
async fn test_batch_with_malformed_first_file_writes_nothing() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let result = h
        .ingestor
        .ingest_new(
            vec![fixture("malformed.ckl"), fixture("sample.ckl")],
            None,
            "Echo",
            None,
        )
        .await;

    assert!(result.is_err());
    assert_eq!(h.store.artifact_count().await, 0);
    assert_eq!(h.store.group_count().await, 0);
    assert!(h.drain_events().is_empty());
}

#[tokio::test]
async fn test_update_preserves_creator_and_group() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(vec![fixture("sample.ckl")], None, "Foxtrot", Some(actor(1)))
        .await
        .unwrap();
    let id = outcome.persisted[0].clone();
    let group_id = outcome.system_group_id.unwrap();
    let other_group = h
        .store
        .add_system_group(SystemGroup::new("Other", None))
        .await
        .unwrap();
    h.drain_events();

    let updated = h
        .ingestor
        .ingest_update(&id, fixture("sample.ckl"), Some(other_group.id.as_str()), Some(actor(2)))
        .await
        .unwrap();

    assert_eq!(updated.id, id);
    assert_eq!(updated.created_by, Some(actor(1)));
    assert_eq!(updated.updated_by, Some(actor(2)));
    assert_eq!(updated.system_group_id, group_id);
    assert_eq!(updated.system_title, "Foxtrot");

    let stored = h.store.get_artifact(&id).await.unwrap().unwrap();
    assert_eq!(stored, updated);
    assert_eq!(h.store.artifact_count().await, 1);

    assert_eq!(
        h.drain_events(),
        vec![("checklist.save.update".to_owned(), id)]
    );
}

#[tokio::test]
async fn test_update_with_scan_result_merges_statuses() {
    let h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(vec![fixture("sample.ckl")], None, "Golf", None)
        .await
        .unwrap();
    let id = &outcome.persisted[0];

    let updated = h
        .ingestor
        .ingest_update(id, fixture("xccdf-results.xml"), None, None)
        .await
        .unwrap();

    // Not_Reviewed -> NotAFinding, Open stays Open
    assert!(updated.raw_checklist.contains(
        "<ATTRIBUTE_DATA>SV-87869r1_rule</ATTRIBUTE_DATA></STIG_DATA><STATUS>NotAFinding</STATUS>"
    ));
    assert!(updated.raw_checklist.contains(
        "<ATTRIBUTE_DATA>SV-87871r1_rule</ATTRIBUTE_DATA></STIG_DATA><STATUS>Open</STATUS>"
    ));
    assert!(updated.raw_checklist.contains("Reviewed manually."));
    assert_eq!(updated.host_name, "APP-SRV-01");
}

#[tokio::test]
async fn test_update_missing_artifact_publishes_nothing() {
    let mut h = Harness::new(BatchPolicy::AbortOnError);

    let err = h
        .ingestor
        .ingest_update("missing", fixture("sample.ckl"), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::ArtifactNotFound(_)));
    assert!(h.drain_events().is_empty());
}

#[tokio::test]
async fn test_failed_update_leaves_prior_artifact() {
    let h = Harness::new(BatchPolicy::AbortOnError);

    let outcome = h
        .ingestor
        .ingest_new(vec![fixture("sample.ckl")], None, "", None)
        .await
        .unwrap();
    let id = &outcome.persisted[0];
    let before = h.store.get_artifact(id).await.unwrap().unwrap();

    let err = h
        .ingestor
        .ingest_update(id, fixture("malformed.ckl"), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "parse");

    let after = h.store.get_artifact(id).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_topic_prefix_is_applied() {
    let mut h = Harness::with_prefix(BatchPolicy::AbortOnError, "openrmf");

    h.ingestor
        .ingest_new(vec![fixture("sample.ckl")], None, "", None)
        .await
        .unwrap();

    let topics: Vec<String> = h.drain_events().into_iter().map(|(t, _)| t).collect();
    assert_eq!(
        topics,
        vec!["openrmf.checklist.save.new", "openrmf.system.count.add"]
    );
}

#[tokio::test]
async fn test_file_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
    let (publisher, _events) = ChannelPublisher::new(16, "");
    let ingestor = ChecklistIngestorBuilder::new(Arc::clone(&store), Arc::new(publisher))
        .build()
        .unwrap();

    let outcome = ingestor
        .ingest_new(vec![fixture("sample.ckl")], None, "Hotel", Some(actor(5)))
        .await
        .unwrap();
    let id = &outcome.persisted[0];

    let reopened = FileStore::open(dir.path()).await.unwrap();
    let artifact = reopened.get_artifact(id).await.unwrap().unwrap();
    assert_eq!(artifact.system_title, "Hotel");
    assert_eq!(artifact.created_by, Some(actor(5)));

    let group = reopened
        .get_system_group(&artifact.system_group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(group.title, "Hotel");
}
