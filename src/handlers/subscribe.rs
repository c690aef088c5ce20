use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::extract::ApiJson;
use crate::utils::validation::is_valid_email;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubscribeResponse {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
        }
    }
}

/// Add an address to the newsletter list
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SubscribeRequest>,
) -> (StatusCode, Json<SubscribeResponse>) {
    let Some(email) = payload
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| is_valid_email(e))
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(SubscribeResponse::failure("Invalid email address")),
        );
    };

    let Some(newsletter) = state.newsletter.as_ref() else {
        tracing::error!("Newsletter list is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SubscribeResponse::failure("Failed to subscribe")),
        );
    };

    match newsletter.subscribe(&email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(SubscribeResponse {
                success: true,
                message: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Newsletter subscription failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubscribeResponse::failure("Failed to subscribe")),
            )
        }
    }
}
