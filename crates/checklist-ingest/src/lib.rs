//! Stigpost checklist ingestion pipeline.
//!
//! Turns uploaded CKL checklists and XCCDF scan results into stored,
//! normalized checklist documents linked to a system group, and announces
//! every change on the event publisher.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`IngestError`)
//! - [`config`]: Ingestor configuration (`IngestorConfig`, `BatchPolicy`)
//! - [`classifier`]: Upload file type detection (`FileTypeClassifier`, `FileKind`)
//! - [`sanitize`]: Whitespace cleanup applied before storage
//! - [`normalizer`]: Metadata extraction and abbreviation tables (`ChecklistNormalizer`)
//! - [`scap`]: Scan result conversion (`ScanAdapter`, `XccdfScanAdapter`)
//! - [`resolver`]: System group lookup and lazy creation (`SystemGroupResolver`)
//! - [`store`]: Reference stores (`MemoryStore`, `FileStore`)
//! - [`publisher`]: In-process event publisher (`ChannelPublisher`)
//! - [`ingestor`]: Main orchestrator (`ChecklistIngestor`, `ChecklistIngestorBuilder`)
//!
//! # Architecture
//!
//! ```text
//! UploadedFile --> FileTypeClassifier --+-- .ckl --------------------+
//!                                       |                            |
//!                                       +-- .xml --> ScanAdapter ----+
//!                                                                    |
//!                                                              sanitize
//!                                                                    |
//!                                                        ChecklistNormalizer
//!                                                                    |
//!                                   SystemGroupResolver --> Artifact (stamped, linked)
//!                                                                    |
//!                                                             ArtifactStore
//!                                                                    |
//!                                                  EventPublisher (save.new / count.add)
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod ingestor;
pub mod normalizer;
pub mod publisher;
pub mod resolver;
pub mod sanitize;
pub mod scap;
pub mod store;

// --- Public API Re-exports ---

// Orchestrator
pub use ingestor::{
    BatchOutcome, ChecklistIngestor, ChecklistIngestorBuilder, FileFailure, UploadedFile,
};

// Configuration
pub use config::{BatchPolicy, IngestorConfig};

// Error
pub use error::IngestError;

// Components
pub use classifier::{FileKind, FileTypeClassifier};
pub use normalizer::{ChecklistNormalizer, NormalizedChecklist};
pub use resolver::{ResolvedGroup, SystemGroupResolver};
pub use sanitize::sanitize;
pub use scap::{ChecklistStatus, RuleResult, RuleResultSet, ScanAdapter, XccdfScanAdapter};

// Collaborators
pub use publisher::ChannelPublisher;
pub use store::{FileStore, MemoryStore};
