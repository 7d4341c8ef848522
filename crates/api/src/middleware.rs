//! Request extractors and middleware.
//!
//! - **auth** - `CubbyAccess` extractor: bearer token → cubby scope check
//! - **client** - caller address for request spans
//! - **origin** - cross-origin write protection

pub mod auth;
pub mod client;
pub mod origin;
