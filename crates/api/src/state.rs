use std::sync::Arc;

use crate::{config::Config, services::TokenTable, stores::Stores};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Message stores (redb).
    pub stores: Stores,
    /// Bearer token bindings, fixed for the life of the process.
    pub tokens: Arc<TokenTable>,
}
