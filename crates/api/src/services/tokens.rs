//! Bearer token table.
//!
//! Tokens are configured once at startup as `token:scope` pairs separated by
//! `;`, where the scope is a cubby name or `*` for every cubby:
//!
//! ```text
//! s3cret:alerts;0ps-t0ken:*
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Scope marker granting access to every cubby.
pub const WILDCARD: &str = "*";

/// What a token may access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Exactly one cubby, matched byte for byte.
    Cubby(String),
    /// Every cubby.
    All,
}

impl Scope {
    pub fn permits(&self, cubby: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Cubby(name) => name == cubby,
        }
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        if scope == WILDCARD {
            Scope::All
        } else {
            Scope::Cubby(scope.to_string())
        }
    }
}

/// Errors identify entries by position so tokens never end up in logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenSpecError {
    #[error("no auth tokens configured")]
    NoTokensConfigured,

    #[error("invalid auth token entry #{entry}: {reason}")]
    InvalidTokenSpec { entry: usize, reason: &'static str },
}

/// Immutable token → scope bindings.
#[derive(Clone)]
pub struct TokenTable {
    bindings: HashMap<String, Scope>,
}

impl fmt::Debug for TokenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenTable")
            .field("tokens", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

impl TokenTable {
    /// Whether `token` may access `cubby`. Unknown tokens may access nothing.
    pub fn authorize(&self, token: &str, cubby: &str) -> bool {
        self.bindings
            .get(token)
            .is_some_and(|scope| scope.permits(cubby))
    }

    pub fn scope(&self, token: &str) -> Option<&Scope> {
        self.bindings.get(token)
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.bindings.len()
    }
}

impl FromStr for TokenTable {
    type Err = TokenSpecError;

    /// Parses the whole list or nothing. Blank entries are skipped; a token
    /// defined twice keeps its last scope.
    fn from_str(list: &str) -> Result<Self, Self::Err> {
        let mut bindings = HashMap::new();

        let entries = list.split(';').map(str::trim).filter(|e| !e.is_empty());
        for (index, entry) in entries.enumerate() {
            let entry_no = index + 1;
            let (token, scope) = entry.split_once(':').ok_or(TokenSpecError::InvalidTokenSpec {
                entry: entry_no,
                reason: "expected token:cubby",
            })?;

            let (token, scope) = (token.trim(), scope.trim());
            if token.is_empty() || scope.is_empty() {
                return Err(TokenSpecError::InvalidTokenSpec {
                    entry: entry_no,
                    reason: "token and cubby cannot be empty",
                });
            }

            bindings.insert(token.to_string(), Scope::from(scope));
        }

        if bindings.is_empty() {
            return Err(TokenSpecError::NoTokensConfigured);
        }

        Ok(Self { bindings })
    }
}
