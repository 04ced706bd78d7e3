//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use idea_polisher_core::{domain::User, ports::PortError};
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
        magic_link_handler,
        logout_handler,
        history_handler,
    ),
    components(
        schemas(MagicLinkRequest, HistoryItemResponse)
    ),
    tags(
        (name = "Idea Polisher API", description = "API endpoints for the idea polishing service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The request payload for initiating passwordless sign-in.
#[derive(Deserialize, ToSchema)]
pub struct MagicLinkRequest {
    email: String,
}

/// One archived idea as returned by the history endpoint.
#[derive(Serialize, ToSchema)]
pub struct HistoryItemResponse {
    archive_id: String,
    title: String,
    original_notes: String,
    polished_outline: String,
    expansion_ideas: String,
    recipient_email: Option<String>,
    category: String,
    created_at: DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Request a magic sign-in link.
///
/// Sends a one-time sign-in link to the given address via the hosted auth
/// provider. The response is 202 regardless of whether the address already
/// has an account; the provider creates one on first use.
#[utoipa::path(
    post,
    path = "/auth/magic-link",
    request_body = MagicLinkRequest,
    responses(
        (status = 202, description = "Magic link email queued"),
        (status = 400, description = "The auth provider rejected the address"),
        (status = 502, description = "The auth provider could not be reached")
    )
)]
pub async fn magic_link_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<MagicLinkRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match app_state.auth.request_magic_link(&payload.email).await {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(PortError::Service(msg)) => Err((StatusCode::BAD_REQUEST, msg)),
        Err(e) => {
            error!("Failed to request magic link: {:?}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                "Auth provider unavailable".to_string(),
            ))
        }
    }
}

/// Revoke the caller's session token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 400, description = "Missing bearer token"),
        (status = 502, description = "The auth provider could not be reached")
    ),
    params(
        ("Authorization" = String, Header, description = "Bearer access token to revoke.")
    )
)]
pub async fn logout_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    let token = bearer_token(&headers).ok_or((
        StatusCode::BAD_REQUEST,
        "Authorization bearer token is required".to_string(),
    ))?;

    match app_state.auth.sign_out(token).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to sign out: {:?}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                "Auth provider unavailable".to_string(),
            ))
        }
    }
}

/// List the caller's archived ideas, newest first.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Archived ideas for the authenticated user", body = [HistoryItemResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("Authorization" = String, Header, description = "Bearer access token.")
    )
)]
pub async fn history_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.archive.list_history(user.user_id).await {
        Ok(items) => {
            let response: Vec<HistoryItemResponse> = items
                .into_iter()
                .map(|item| HistoryItemResponse {
                    archive_id: item.archive_id,
                    title: item.title,
                    original_notes: item.original_notes,
                    polished_outline: item.polished_outline,
                    expansion_ideas: item.expansion_ideas,
                    recipient_email: item.recipient_email,
                    category: item.category,
                    created_at: item.created_at,
                })
                .collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!("Failed to list history: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list history".to_string(),
            ))
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
