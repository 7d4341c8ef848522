//! Shared test utilities for API handler tests.
//!
//! Provides message factories and a `TestStateBuilder` for constructing
//! `AppState` instances with either a mock store or a real redb store.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::{TestStateBuilder, mock_message};
//!
//! let mut store = MockCubbyStore::new();
//! store.expect_retrieve().returning(|_| Ok(vec![mock_message(Utc::now(), "hi")]));
//!
//! let state = TestStateBuilder::new()
//!     .with_cubby_store(store)
//!     .build();
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::config::Config;
use crate::models::Message;
use crate::services::TokenTable;
use crate::state::AppState;
use crate::stores::{CubbyStore, MockCubbyStore, RedbCubbyStore, Stores};

/// Token allowed into every cubby by the default test table.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Token allowed into the `alerts` cubby only.
pub const ALERTS_TOKEN: &str = "alerts-token";

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        tokens: format!("{ADMIN_TOKEN}:*;{ALERTS_TOKEN}:alerts"),
        db_path: PathBuf::from("unused.db"),
        listen: "127.0.0.1:0".to_string(),
        open_timeout_ms: 1_000,
        max_body_bytes: 1024 * 1024,
        env: "test".to_string(),
    }
}

/// Creates a message stored at the given instant.
pub fn mock_message(time: DateTime<Utc>, content: &str) -> Message {
    Message {
        time,
        content: content.to_string(),
    }
}

/// Opens a real store in a fresh temporary directory. Keep the `TempDir`
/// alive for as long as the store is used.
pub fn temp_store() -> (RedbCubbyStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store =
        RedbCubbyStore::open(&temp_dir.path().join("test.db"), Duration::from_secs(1)).unwrap();
    (store, temp_dir)
}

/// Builder for constructing test `AppState`.
///
/// Uses an empty mock store and the default token table unless told otherwise.
pub struct TestStateBuilder {
    cubby_store: Option<Arc<dyn CubbyStore>>,
    tokens: Option<String>,
    max_body_bytes: Option<usize>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            cubby_store: None,
            tokens: None,
            max_body_bytes: None,
        }
    }

    pub fn with_cubby_store(self, store: MockCubbyStore) -> Self {
        self.with_store(Arc::new(store))
    }

    pub fn with_store(mut self, store: Arc<dyn CubbyStore>) -> Self {
        self.cubby_store = Some(store);
        self
    }

    /// Replaces the token table, e.g. `"alpha:alpha;admin:*"`.
    pub fn with_tokens(mut self, tokens: &str) -> Self {
        self.tokens = Some(tokens.to_string());
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    pub fn build(self) -> AppState {
        let mut config = test_config();
        if let Some(tokens) = self.tokens {
            config.tokens = tokens;
        }
        if let Some(limit) = self.max_body_bytes {
            config.max_body_bytes = limit;
        }

        let tokens: TokenTable = config.token_table().unwrap();

        let stores = Stores {
            cubbies: self
                .cubby_store
                .unwrap_or_else(|| Arc::new(MockCubbyStore::new())),
        };

        AppState {
            config,
            stores,
            tokens: Arc::new(tokens),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
