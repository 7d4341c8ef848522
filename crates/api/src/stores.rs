//! Durable message storage (redb).
//!
//! ## Stores
//!
//! - **cubbies** - Per-cubby ordered message ledgers
//! - **keys** - Timestamp key codec the ledgers are ordered by
//!
//! ## Layout
//!
//! ```text
//! table "cubby:{name}"
//!   2026-10-18T09:41:07.123456789Z → "message text"
//!   2026-10-18T09:41:09.000000001Z → "another message"
//! ```
//!
//! ## Usage in Handlers
//!
//! Stores are accessed via `state.stores`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     state.stores.cubbies.insert("alerts", "disk almost full").await?;
//!     let messages = state.stores.cubbies.retrieve("alerts").await?;
//! }
//! ```

mod cubbies;
pub mod keys;

pub use cubbies::{CubbyStore, RedbCubbyStore, StoreError};

#[cfg(test)]
pub use cubbies::MockCubbyStore;

use std::sync::Arc;

/// Collection of all stores.
#[derive(Clone)]
pub struct Stores {
    pub cubbies: Arc<dyn CubbyStore>,
}
