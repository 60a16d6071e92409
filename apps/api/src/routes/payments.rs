use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;
use crate::workflow::{PaymentConfirmation, PaymentInitOutcome, FREE_TIER_MESSAGE};

#[derive(Deserialize)]
pub struct InitializePaymentRequest {
    pub email: Option<String>,
}

/// POST /initialize-payment
pub async fn initialize_payment_handler(
    State(state): State<AppState>,
    Json(request): Json<InitializePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let email = request
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    match state.workflow.initialize_payment(&email).await? {
        PaymentInitOutcome::FreeTier => Ok(Json(json!({
            "status": "success",
            "free_tier": true,
            "message": FREE_TIER_MESSAGE
        }))),
        PaymentInitOutcome::Redirect(payment) => Ok(Json(json!({
            "status": "success",
            "url": payment.authorization_url,
            "reference": payment.reference
        }))),
    }
}

#[derive(Deserialize)]
pub struct VerifyPaymentQuery {
    pub reference: Option<String>,
}

/// GET /verify-payment?reference=
///
/// Every branch carries an explicit `status` field; a gateway decline is a
/// 200 with `status: "failed"`, not an error.
pub async fn verify_payment_handler(
    State(state): State<AppState>,
    Query(query): Query<VerifyPaymentQuery>,
) -> Response {
    let Some(reference) = query.reference.filter(|reference| !reference.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Payment reference is required",
                "status": "error"
            })),
        )
            .into_response();
    };

    match state.workflow.confirm_payment(&reference).await {
        Ok(PaymentConfirmation::Verified) => Json(json!({
            "status": "success",
            "message": "Payment verified successfully"
        }))
        .into_response(),
        Ok(PaymentConfirmation::Declined { gateway_message }) => Json(json!({
            "status": "failed",
            "message": "Payment not successful",
            "details": gateway_message
        }))
        .into_response(),
        Err(err) => {
            tracing::error!("{err}");
            let (status, error, details) = err.response_parts();
            let mut body = json!({ "error": error, "status": "error" });
            if let Some(details) = details {
                body["details"] = json!(details);
            }
            (status, Json(body)).into_response()
        }
    }
}
