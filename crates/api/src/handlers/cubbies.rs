//! Cubby message endpoints.
//!
//! A cubby is a named, time-ordered list of short text messages. The cubby
//! name is the whole request path (`/alerts`, `/team/ops`), and every
//! request needs a bearer token scoped to that cubby or to `*`.
//!
//! ## Endpoints
//!
//! - POST /{cubby} - Store a message (201)
//! - GET /{cubby} - List messages, oldest first (200, JSON)
//! - DELETE /{cubby} - Delete every message (204)
//! - DELETE /{cubby}?notafter=<RFC 3339> - Delete messages at or before a time (204)

use anyhow::Context;
use axum::{
    Json, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{error::AppError, middleware::auth::CubbyAccess, state::AppState};

use super::content::MessageContent;

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    /// Only delete messages stored at or before this instant.
    pub notafter: Option<String>,
}

#[debug_handler]
pub async fn post_message(
    access: CubbyAccess,
    State(state): State<AppState>,
    MessageContent(content): MessageContent,
) -> Result<impl IntoResponse, AppError> {
    let cubby = access.cubby;

    let stored_at = state
        .stores
        .cubbies
        .insert(&cubby, &content)
        .await
        .with_context(|| format!("failed to store message in cubby {cubby:?}"))?;

    tracing::info!(cubby = %cubby, time = %stored_at, "message stored");

    Ok(StatusCode::CREATED)
}

#[debug_handler]
pub async fn get_messages(
    access: CubbyAccess,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let cubby = access.cubby;

    let messages = state
        .stores
        .cubbies
        .retrieve(&cubby)
        .await
        .with_context(|| format!("failed to retrieve messages from cubby {cubby:?}"))?;

    tracing::debug!(cubby = %cubby, count = messages.len(), "messages retrieved");

    Ok(Json(messages))
}

/// Clears the cubby, or prunes it when `notafter` is given. Deleting from a
/// cubby that holds nothing still succeeds.
#[debug_handler]
pub async fn delete_messages(
    access: CubbyAccess,
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    let cubby = access.cubby;

    match params.notafter.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => {
            let not_after = parse_not_after(raw)?;

            state
                .stores
                .cubbies
                .prune_before(&cubby, not_after)
                .await
                .with_context(|| {
                    format!("failed to delete messages before {not_after} from cubby {cubby:?}")
                })?;

            tracing::info!(cubby = %cubby, notafter = %not_after, "deleted old messages");
        }
        None => {
            state
                .stores
                .cubbies
                .clear(&cubby)
                .await
                .with_context(|| format!("failed to clear cubby {cubby:?}"))?;

            tracing::info!(cubby = %cubby, "deleted all messages");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

fn parse_not_after(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| {
            tracing::info!(value = %raw, "rejected notafter timestamp");
            AppError::Validation("Invalid timestamp format".to_string())
        })
}
