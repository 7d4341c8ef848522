//! Cubby access control using the configured bearer token table.
//!
//! Usage: Add `CubbyAccess` as an extractor parameter to require a token that
//! is scoped to the cubby named by the request path.
//!
//! ```ignore
//! async fn my_handler(access: CubbyAccess, ...) -> ... {
//!     // access.cubby is the authorized cubby name
//! }
//! ```

use axum::{
    Json, RequestPartsExt,
    extract::{FromRequestParts, Path},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::state::AppState;

/// A cubby the caller's token has been checked against.
///
/// The name is resolved from the path once per request and handed to the
/// handler explicitly.
#[derive(Debug)]
pub struct CubbyAccess {
    pub cubby: String,
}

impl FromRequestParts<AppState> for CubbyAccess {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        // The bare root has no path parameter at all.
        let cubby = parts
            .extract::<Path<String>>()
            .await
            .map(|Path(cubby)| cubby)
            .unwrap_or_default();

        if cubby.is_empty() {
            return Err(AuthError::MissingCubby);
        }

        if !state.tokens.authorize(bearer.token(), &cubby) {
            tracing::info!(
                cubby = %cubby,
                known_token = state.tokens.scope(bearer.token()).is_some(),
                "denied access to cubby"
            );
            return Err(AuthError::Forbidden);
        }

        Ok(CubbyAccess { cubby })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    MissingCubby,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::MissingCubby => (StatusCode::BAD_REQUEST, "Missing cubby name"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Not authorized for this cubby"),
        };

        let body = serde_json::json!({ "error": message });

        (status, Json(body)).into_response()
    }
}
