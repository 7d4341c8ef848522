//! HTTP handlers.
//!
//! - **cubbies** - store, list and delete cubby messages
//! - **content** - message text extraction from request bodies

mod content;
pub mod cubbies;

use axum::{
    Router,
    routing::{MethodRouter, get},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    // The root route exists so a bare `/` reaches the handlers and is
    // rejected there as a missing cubby name rather than a 404.
    Router::new()
        .route("/", cubby_methods())
        .route("/{*cubby}", cubby_methods())
}

fn cubby_methods() -> MethodRouter<AppState> {
    get(cubbies::get_messages)
        .post(cubbies::post_message)
        .delete(cubbies::delete_messages)
}
