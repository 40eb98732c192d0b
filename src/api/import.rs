//! Import API handlers
//!
//! POST /api/import, GET /api/import/history, GET /api/import/file/{key}

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::blob::BlobError;
use crate::db::history;
use crate::error::{ApiError, ApiResult};
use crate::models::ImportAttempt;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// Fail deterministically after the blob upload step; exercises the
    /// compensation path end to end.
    #[serde(default)]
    pub simulate_failure: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub message: String,
    pub imported: usize,
    pub object_key: String,
}

/// POST /api/import — multipart file upload
pub async fn import_movies(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportResponse>> {
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload.json").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
            upload = Some((file_name, content_type, bytes.to_vec()));
        }
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }

    let outcome = state
        .orchestrator
        .import_batch(
            &file_name,
            content_type.as_deref(),
            &bytes,
            query.simulate_failure,
        )
        .await?;

    Ok(Json(ImportResponse {
        message: "File imported successfully".to_string(),
        imported: outcome.imported,
        object_key: outcome.object_key,
    }))
}

/// GET /api/import/history — all attempts, newest first
pub async fn import_history(State(state): State<AppState>) -> ApiResult<Json<Vec<ImportAttempt>>> {
    let attempts = history::list_attempts(&state.db).await?;
    Ok(Json(attempts))
}

/// GET /api/import/file/{object_key} — download a retained upload
///
/// Pure passthrough to the blob store, gated on the key appearing in a past
/// audit entry.
pub async fn download_file(
    State(state): State<AppState>,
    Path(object_key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !history::key_recorded(&state.db, &object_key).await? {
        return Err(ApiError::NotFound(format!("No import recorded for {object_key}")));
    }

    let bytes = state.blob.get(&object_key).await.map_err(|e| match e {
        BlobError::NotFound(key) => ApiError::NotFound(format!("Object not found: {key}")),
        BlobError::InvalidKey(key) => ApiError::BadRequest(format!("Invalid object key: {key}")),
        BlobError::Io(e) => ApiError::Internal(e.to_string()),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{object_key}\""),
            ),
        ],
        bytes,
    ))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/api/import", post(import_movies))
        .route("/api/import/history", get(import_history))
        .route("/api/import/file/:object_key", get(download_file))
}
