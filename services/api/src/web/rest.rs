//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use docqa_core::domain::{
    DocumentMeta, ExportBundle, IncomingFile, MatchField, QaItem, SearchResult, Theme,
    UploadProgress, UploadStatus, ACCEPTED_EXTENSIONS,
};
use docqa_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_documents_handler,
        upload_document_handler,
        get_document_handler,
        delete_document_handler,
        list_document_qa_handler,
        export_document_handler,
        ask_handler,
        list_uploads_handler,
        cancel_upload_handler,
        get_search_handler,
        set_search_handler,
        get_settings_handler,
        update_settings_handler,
        cycle_theme_handler,
    ),
    components(
        schemas(
            HealthResponse,
            DocumentPayload,
            QaItemPayload,
            UploadProgressPayload,
            SearchResultPayload,
            SearchView,
            ExportPayload,
            AskRequest,
            SetSearchRequest,
            SettingsPayload,
            UpdateSettingsRequest,
        )
    ),
    tags(
        (name = "DocQA API", description = "API endpoints for the document Q&A demo: simulated uploads, templated answers, search and export.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Service liveness plus the in-flight simulation counters.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    active_uploads: usize,
    asking: usize,
}

/// A document as returned by the API. Mirrors the persisted form.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    id: String,
    name: String,
    size: u64,
    #[serde(rename = "type")]
    mime_type: String,
    created_at: DateTime<Utc>,
}

impl From<DocumentMeta> for DocumentPayload {
    fn from(d: DocumentMeta) -> Self {
        Self {
            id: d.id,
            name: d.name,
            size: d.size,
            mime_type: d.mime_type,
            created_at: d.created_at,
        }
    }
}

/// One completed question/answer exchange.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QaItemPayload {
    id: String,
    doc_id: String,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}

impl From<QaItem> for QaItemPayload {
    fn from(qa: QaItem) -> Self {
        Self {
            id: qa.id,
            doc_id: qa.doc_id,
            question: qa.question,
            answer: qa.answer,
            created_at: qa.created_at,
        }
    }
}

/// Progress of one live simulated upload.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressPayload {
    doc_id: String,
    percent: u8,
    status: String,
}

impl From<UploadProgress> for UploadProgressPayload {
    fn from(p: UploadProgress) -> Self {
        let status = match p.status {
            UploadStatus::Uploading => "uploading",
            UploadStatus::Done => "done",
            UploadStatus::Error => "error",
        };
        Self {
            doc_id: p.doc_id,
            percent: p.percent,
            status: status.to_string(),
        }
    }
}

/// One search hit: the record, its document, and which field matched.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPayload {
    qa_item: QaItemPayload,
    document: DocumentPayload,
    matched_text: String,
    #[serde(rename = "type")]
    field: String,
}

impl From<SearchResult> for SearchResultPayload {
    fn from(r: SearchResult) -> Self {
        let field = match r.field {
            MatchField::Question => "question",
            MatchField::Answer => "answer",
        };
        Self {
            qa_item: r.qa_item.into(),
            document: r.document.into(),
            matched_text: r.matched_text,
            field: field.to_string(),
        }
    }
}

/// The live query, the debounced query, and the results it produced.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    query: String,
    settled_query: String,
    results: Vec<SearchResultPayload>,
}

/// The downloadable export of one document's Q&A history.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    document: DocumentPayload,
    qa_items: Vec<QaItemPayload>,
    exported_at: DateTime<Utc>,
    total_questions: usize,
}

impl From<ExportBundle> for ExportPayload {
    fn from(b: ExportBundle) -> Self {
        Self {
            document: b.document.into(),
            qa_items: b.qa_items.into_iter().map(Into::into).collect(),
            exported_at: b.exported_at,
            total_questions: b.total_questions,
        }
    }
}

/// The payload for asking a question against the selected document.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// The selected document. Omitting it fails with "No document selected".
    pub document_id: Option<String>,
    pub question: String,
}

/// The payload for updating the live search query.
#[derive(Deserialize, ToSchema)]
pub struct SetSearchRequest {
    pub query: String,
}

/// The persisted application settings.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    theme: String,
    ui_scale: f64,
}

/// Partial settings update; absent fields are left untouched.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub theme: Option<String>,
    pub ui_scale: Option<f64>,
}

fn theme_str(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
        Theme::System => "system",
    }
}

fn parse_theme(value: &str) -> Option<Theme> {
    match value {
        "light" => Some(Theme::Light),
        "dark" => Some(Theme::Dark),
        "system" => Some(Theme::System),
        _ => None,
    }
}

fn settings_payload(state: &AppState) -> SettingsPayload {
    SettingsPayload {
        theme: theme_str(state.store.theme()).to_string(),
        ui_scale: state.store.ui_scale(),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Service health and simulation counters.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_uploads: state.uploads.active_count(),
        asking: state.asks.in_flight(),
    })
}

/// List all documents, newest first.
#[utoipa::path(
    get,
    path = "/documents",
    responses((status = 200, description = "All documents", body = [DocumentPayload]))
)]
pub async fn list_documents_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let documents: Vec<DocumentPayload> =
        state.store.documents().into_iter().map(Into::into).collect();
    Json(documents)
}

/// Upload a document through the simulated transfer.
///
/// Accepts a multipart/form-data request with a single file part. Only the
/// file's name, size and MIME type are read; content is discarded. The
/// advertised extension allow-list (pdf, doc, docx, txt, md) is not
/// enforced; every file simulates identically.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 201, description = "Upload completed, document created", body = DocumentPayload),
        (status = 400, description = "Multipart form did not include a file"),
        (status = 409, description = "Upload was canceled mid-transfer"),
        (status = 502, description = "Simulated transfer failure; re-initiate to retry")
    )
)]
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let file = if let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.file_name().unwrap_or("untitled.txt").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        IncomingFile {
            name,
            size: data.len() as u64,
            mime_type,
        }
    } else {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Multipart form must include a file (accepted: {})",
                ACCEPTED_EXTENSIONS.join(", ")
            ),
        ));
    };

    let document = match state.uploads.start(file).await {
        Ok(document) => document,
        Err(PortError::UploadFailed) => {
            return Err((StatusCode::BAD_GATEWAY, "Upload failed".to_string()));
        }
        Err(PortError::UploadCancelled) => {
            return Err((StatusCode::CONFLICT, "Upload canceled".to_string()));
        }
        Err(e) => {
            error!("Upload ended unexpectedly: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Upload failed unexpectedly".to_string(),
            ));
        }
    };

    state.store.add_document(document.clone()).map_err(|e| {
        error!("Failed to persist uploaded document: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist the document".to_string(),
        )
    })?;

    Ok((StatusCode::CREATED, Json(DocumentPayload::from(document))))
}

/// Fetch one document.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 200, description = "The document", body = DocumentPayload),
        (status = 404, description = "Unknown document")
    )
)]
pub async fn get_document_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .document(&id)
        .map(|d| Json(DocumentPayload::from(d)))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Document {} not found", id)))
}

/// Delete a document and, together with it, its entire Q&A history.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 204, description = "Document and its Q&A records removed"),
        (status = 404, description = "Unknown document")
    )
)]
pub async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.store.remove_document(&id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(PortError::NotFound(message)) => Err((StatusCode::NOT_FOUND, message)),
        Err(e) => {
            error!("Failed to delete document {}: {:?}", id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete the document".to_string(),
            ))
        }
    }
}

/// The Q&A history of one document, newest first.
#[utoipa::path(
    get,
    path = "/documents/{id}/qa",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 200, description = "The document's Q&A records", body = [QaItemPayload]),
        (status = 404, description = "Unknown document")
    )
)]
pub async fn list_document_qa_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if state.store.document(&id).is_none() {
        return Err((StatusCode::NOT_FOUND, format!("Document {} not found", id)));
    }
    let qa_items: Vec<QaItemPayload> =
        state.store.qa_for_doc(&id).into_iter().map(Into::into).collect();
    Ok(Json(qa_items))
}

/// Download the document's Q&A history as a JSON export.
#[utoipa::path(
    get,
    path = "/documents/{id}/export",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 200, description = "The export bundle, offered as an attachment", body = ExportPayload),
        (status = 404, description = "Unknown document")
    )
)]
pub async fn export_document_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bundle = state.store.export(&id).map_err(|e| match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => {
            error!("Failed to export document {}: {:?}", id, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export the document".to_string(),
            )
        }
    })?;

    let disposition = format!("attachment; filename=\"doc-{}.json\"", id);
    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(ExportPayload::from(bundle)),
    ))
}

/// Ask a question against the selected document.
///
/// Waits out the simulated answering delay, then persists and returns the
/// completed record. Omitting `documentId` fails immediately.
#[utoipa::path(
    post,
    path = "/qa",
    request_body = AskRequest,
    responses(
        (status = 201, description = "Question answered and recorded", body = QaItemPayload),
        (status = 400, description = "No document selected, or blank question"),
        (status = 404, description = "Unknown document")
    )
)]
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .asks
        .ask(request.document_id.as_deref(), &request.question)
        .await
    {
        Ok(qa_item) => Ok((StatusCode::CREATED, Json(QaItemPayload::from(qa_item)))),
        Err(PortError::NoDocumentSelected) => {
            Err((StatusCode::BAD_REQUEST, "No document selected".to_string()))
        }
        Err(PortError::NotFound(message)) => Err((StatusCode::NOT_FOUND, message)),
        Err(PortError::Unexpected(message)) => Err((StatusCode::BAD_REQUEST, message)),
        Err(e) => {
            error!("Ask flow failed: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to answer the question".to_string(),
            ))
        }
    }
}

/// The live upload progress entries.
#[utoipa::path(
    get,
    path = "/uploads",
    responses((status = 200, description = "In-flight and lingering uploads", body = [UploadProgressPayload]))
)]
pub async fn list_uploads_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uploads: Vec<UploadProgressPayload> =
        state.uploads.snapshot().into_iter().map(Into::into).collect();
    Json(uploads)
}

/// Cancel an in-flight upload (or dismiss a failed one).
#[utoipa::path(
    delete,
    path = "/uploads/{id}",
    params(("id" = String, Path, description = "The upload's document id.")),
    responses(
        (status = 204, description = "Upload canceled and entry removed"),
        (status = 404, description = "No live upload with that id")
    )
)]
pub async fn cancel_upload_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if state.uploads.cancel(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Upload {} not found", id)))
    }
}

/// The current search state: live query, settled query, and results.
#[utoipa::path(
    get,
    path = "/search",
    responses((status = 200, description = "The debounced search view", body = SearchView))
)]
pub async fn get_search_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SearchView {
        query: state.search.live(),
        settled_query: state.search.settled(),
        results: state.search.results().into_iter().map(Into::into).collect(),
    })
}

/// Update the live search query; results settle after the debounce window.
#[utoipa::path(
    put,
    path = "/search",
    request_body = SetSearchRequest,
    responses((status = 204, description = "Query recorded"))
)]
pub async fn set_search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetSearchRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.search.set_query(&request.query).map_err(|e| {
        error!("Failed to persist search query: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist the search query".to_string(),
        )
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// The persisted settings.
#[utoipa::path(
    get,
    path = "/settings",
    responses((status = 200, description = "Theme and UI scale", body = SettingsPayload))
)]
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(settings_payload(&state))
}

/// Advance the theme through the light -> dark -> system cycle.
#[utoipa::path(
    post,
    path = "/settings/theme",
    responses((status = 200, description = "The settings after the cycle", body = SettingsPayload))
)]
pub async fn cycle_theme_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.store.cycle_theme().map_err(internal_settings_error)?;
    Ok(Json(settings_payload(&state)))
}

/// Update the persisted settings. The UI scale snaps to the nearest
/// discrete step.
#[utoipa::path(
    put,
    path = "/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "The settings after the update", body = SettingsPayload),
        (status = 400, description = "Unknown theme")
    )
)]
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(theme) = request.theme.as_deref() {
        let theme = parse_theme(theme).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("'{}' is not a theme (expected light, dark or system)", theme),
            )
        })?;
        state.store.set_theme(theme).map_err(internal_settings_error)?;
    }

    if let Some(scale) = request.ui_scale {
        state.store.set_ui_scale(scale).map_err(internal_settings_error)?;
    }

    Ok(Json(settings_payload(&state)))
}

fn internal_settings_error(e: PortError) -> (StatusCode, String) {
    error!("Failed to persist settings: {:?}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to persist settings".to_string(),
    )
}
