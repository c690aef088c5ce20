use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::storage::upload_key;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_uri: String,
}

/// Store a poster image in the bucket (admin)
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::Internal("Object storage is not configured".to_string()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) = upload
        .filter(|(_, _, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("File is required.".to_string()))?;

    let key = upload_key(&file_name);
    let size = bytes.len();
    let file_uri = storage.put_object(&key, bytes.to_vec(), &content_type).await?;

    tracing::info!(key = %key, size, content_type = %content_type, "File uploaded");

    Ok(Json(UploadResponse {
        success: true,
        file_uri,
    }))
}
