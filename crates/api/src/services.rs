//! Request-independent services.
//!
//! ## Services
//!
//! - **tokens** - Bearer token table loaded at startup (token → cubby scope)
//!
//! ## Usage in Handlers
//!
//! The token table lives on `AppState` and is consulted by the `CubbyAccess`
//! extractor, so handlers never check tokens themselves:
//!
//! ```ignore
//! if !state.tokens.authorize(token, &cubby) {
//!     return Err(AuthError::Forbidden);
//! }
//! ```

mod tokens;

pub use tokens::{TokenSpecError, TokenTable};
