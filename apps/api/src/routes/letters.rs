use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLetterRequest {
    pub user_id: Option<String>,
    pub letter_type: Option<String>,
    pub cv_id: Option<String>,
    pub job_desc_id: Option<String>,
}

/// POST /generate-letter
pub async fn generate_letter_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateLetterRequest>,
) -> Result<Json<Value>, AppError> {
    // Absent and empty fields are both "missing".
    let (Some(user_id), Some(letter_type), Some(cv_id), Some(job_desc_id)) = (
        request.user_id.filter(|v| !v.is_empty()),
        request.letter_type.filter(|v| !v.is_empty()),
        request.cv_id.filter(|v| !v.is_empty()),
        request.job_desc_id.filter(|v| !v.is_empty()),
    ) else {
        return Err(AppError::MissingFields);
    };

    let user_id = parse_uuid(&user_id, "userId")?;
    let cv_id = parse_uuid(&cv_id, "cvId")?;
    let job_desc_id = parse_uuid(&job_desc_id, "jobDescId")?;

    let letter = state
        .workflow
        .request_letter(user_id, &letter_type, cv_id, job_desc_id)
        .await?;

    Ok(Json(json!({ "success": true, "data": letter })))
}

/// GET /dashboard/:user_id
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let dashboard = state.workflow.dashboard(user_id).await?;

    Ok(Json(json!({
        "uploads": dashboard.uploads,
        "letters": dashboard.letters
    })))
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, AppError> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("{field} must be a valid UUID")))
}
