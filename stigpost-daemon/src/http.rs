//! HTTP ingress -- multipart checklist uploads.
//!
//! # Routes
//!
//! | Method | Path | Body | Action |
//! |--------|------|------|--------|
//! | `POST` | `/` | `checklistFiles` (repeated), `systemGroupId`, `system` | store new checklists |
//! | `PUT` | `/{id}` | `checklistFile`, `systemGroupId` | replace one checklist |
//! | `GET` | `/healthz` | none | JSON [`DaemonHealth`] |
//!
//! Uploads answer `200` with an empty body on success and `400` with an
//! empty body on any failure. The failure kind only reaches the log.
//!
//! The caller identity comes from a trusted header set by the upstream
//! auth proxy (`server.actor_header`). A missing or blank header means an
//! anonymous caller; a value that is not a UUID is rejected.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::{debug, info, warn};

use stigpost_checklist_ingest::{ChecklistIngestor, IngestError, UploadedFile};
use stigpost_core::event::EventPublisher;
use stigpost_core::store::{ArtifactStore, SystemGroupStore};
use stigpost_core::types::{ActorId, DEFAULT_SYSTEM_TITLE, HealthStatus};

use crate::health::DaemonHealth;

/// Multipart field carrying new checklist files (repeated).
pub const FIELD_NEW_FILES: &str = "checklistFiles";
/// Multipart field carrying the replacement checklist file.
pub const FIELD_UPDATE_FILE: &str = "checklistFile";
/// Multipart field carrying the target system group id.
pub const FIELD_SYSTEM_GROUP_ID: &str = "systemGroupId";
/// Multipart field carrying the title for a newly created system group.
pub const FIELD_SYSTEM_TITLE: &str = "system";

/// Shared router state.
pub struct AppState<S, P>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    ingestor: Arc<ChecklistIngestor<S, P>>,
    actor_header: HeaderName,
    start_time: Instant,
}

impl<S, P> Clone for AppState<S, P>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    fn clone(&self) -> Self {
        Self {
            ingestor: Arc::clone(&self.ingestor),
            actor_header: self.actor_header.clone(),
            start_time: self.start_time,
        }
    }
}

impl<S, P> AppState<S, P>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    /// Create router state.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Config` when `actor_header` is not a valid
    /// HTTP header name.
    pub fn new(
        ingestor: Arc<ChecklistIngestor<S, P>>,
        actor_header: &str,
    ) -> Result<Self, IngestError> {
        let actor_header = HeaderName::try_from(actor_header.trim().to_ascii_lowercase())
            .map_err(|e| IngestError::Config(format!("invalid actor header name: {e}")))?;

        Ok(Self {
            ingestor,
            actor_header,
            start_time: Instant::now(),
        })
    }

    /// Read the caller identity from the trusted header.
    fn actor(&self, headers: &HeaderMap) -> Result<Option<ActorId>, IngestError> {
        let Some(value) = headers.get(&self.actor_header) else {
            return Ok(None);
        };

        let text = value
            .to_str()
            .map_err(|_| IngestError::InvalidActor("non-ASCII header value".to_owned()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        text.parse::<ActorId>()
            .map(Some)
            .map_err(|e| IngestError::InvalidActor(e.to_string()))
    }
}

/// Build the ingestion router.
///
/// `max_upload_bytes` caps the whole request body.
pub fn router<S, P>(state: AppState<S, P>, max_upload_bytes: usize) -> Router
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    Router::new()
        .route("/", post(create_checklists::<S, P>))
        .route("/{id}", put(update_checklist::<S, P>))
        .route("/healthz", get(healthz::<S, P>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Request rejection.
///
/// Every variant answers `400 Bad Request` with an empty body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Ingestion pipeline failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Request is not multipart form data.
    #[error("not a multipart request: {0}")]
    NotMultipart(#[from] MultipartRejection),

    /// Body could not be read as multipart form data.
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// Batch ran under `continue` policy and some files were skipped.
    #[error("{failed} of {total} files failed")]
    PartialBatch {
        /// Number of rejected files.
        failed: usize,
        /// Number of files in the request.
        total: usize,
    },
}

impl ApiError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest(e) => e.kind(),
            Self::NotMultipart(_) | Self::Multipart(_) => "multipart",
            Self::PartialBatch { .. } => "partial_batch",
        }
    }

    /// HTTP status for this rejection.
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error_kind = self.kind(), error = %self, "request rejected");
        self.status_code().into_response()
    }
}

/// Fields collected from one multipart body.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    system_group_id: Option<String>,
    system: Option<String>,
}

/// Drain a multipart body, keeping file parts named `file_field`.
async fn read_form(multipart: &mut Multipart, file_field: &str) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();

        if name == file_field {
            let filename = field.file_name().unwrap_or_default().to_owned();
            let content = field.bytes().await?;
            form.files.push(UploadedFile::new(filename, content));
        } else if name == FIELD_SYSTEM_GROUP_ID {
            form.system_group_id = Some(field.text().await?);
        } else if name == FIELD_SYSTEM_TITLE {
            form.system = Some(field.text().await?);
        } else {
            debug!(field = %name, "ignoring unknown multipart field");
        }
    }

    Ok(form)
}

async fn create_checklists<S, P>(
    State(state): State<AppState<S, P>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StatusCode, ApiError>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    let actor = state.actor(&headers)?;
    let mut multipart = multipart?;
    let form = read_form(&mut multipart, FIELD_NEW_FILES).await?;
    let total = form.files.len();
    let title = form.system.as_deref().unwrap_or(DEFAULT_SYSTEM_TITLE);

    let outcome = state
        .ingestor
        .ingest_new(form.files, form.system_group_id.as_deref(), title, actor)
        .await?;

    if !outcome.is_complete() {
        return Err(ApiError::PartialBatch {
            failed: outcome.failures.len(),
            total,
        });
    }

    info!(
        files = total,
        system_group_id = outcome.system_group_id.as_deref().unwrap_or_default(),
        "checklist upload accepted"
    );
    Ok(StatusCode::OK)
}

async fn update_checklist<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StatusCode, ApiError>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    let actor = state.actor(&headers)?;
    let mut multipart = multipart?;
    let form = read_form(&mut multipart, FIELD_UPDATE_FILE).await?;

    // Only the first file part counts.
    let file = form
        .files
        .into_iter()
        .next()
        .ok_or(IngestError::EmptyBatch)?;

    let artifact = state
        .ingestor
        .ingest_update(&id, file, form.system_group_id.as_deref(), actor)
        .await?;

    info!(artifact_id = %artifact.id, "checklist update accepted");
    Ok(StatusCode::OK)
}

async fn healthz<S, P>(State(state): State<AppState<S, P>>) -> Json<DaemonHealth>
where
    S: ArtifactStore + SystemGroupStore,
    P: EventPublisher,
{
    Json(DaemonHealth::snapshot(state.start_time, HealthStatus::Healthy))
}
