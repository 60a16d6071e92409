use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// POST /upload
///
/// Multipart form with a `file` part plus `user_id` and `document_type`
/// text fields. Unknown parts are ignored.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut user_id: Option<String> = None;
    let mut document_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                file = Some((filename, content_type, bytes));
            }
            "user_id" => {
                user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            "document_type" => {
                document_type = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let user_id: Uuid = user_id
        .as_deref()
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| AppError::Validation("A valid user_id is required".to_string()))?;
    let document_type = document_type
        .ok_or_else(|| AppError::Validation("document_type is required".to_string()))?;

    let stored = state
        .documents
        .store(user_id, &document_type, &filename, bytes, &content_type)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": stored.upload,
        "fileUrl": stored.url
    })))
}
