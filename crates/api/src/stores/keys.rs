//! Message keys: fixed-width, lexicographically sortable timestamps.
//!
//! Every message in a cubby is keyed by the instant it was stored, rendered
//! as `YYYY-MM-DDTHH:MM:SS.nnnnnnnnnZ`. All fields are zero padded and the
//! instant is always normalised to UTC, so comparing two keys byte by byte
//! gives the same answer as comparing the instants. The store relies on this
//! for ordered listing and for range deletes.
//!
//! ```text
//! 2026-10-18T09:41:07.000000001Z  <  2026-10-18T09:41:07.000000002Z
//! ```

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use thiserror::Error;

const KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

/// Byte length of every encoded key.
pub const KEY_LEN: usize = 30;

const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed message key {0:?}")]
    Malformed(String),

    #[error("instant {0} cannot be encoded as a message key")]
    OutOfRange(DateTime<Utc>),
}

/// An encoded message key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageKey(String);

impl MessageKey {
    /// Encodes an instant. Fails for years outside 0000..=9999, which would
    /// not fit the fixed width.
    pub fn encode(instant: DateTime<Utc>) -> Result<Self, KeyError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&instant.year()) {
            return Err(KeyError::OutOfRange(instant));
        }

        Ok(Self(instant.format(KEY_FORMAT).to_string()))
    }

    /// Inclusive upper bound for "everything at or before `instant`".
    ///
    /// Matches `encode` for encodable instants and clamps to the first/last
    /// possible key otherwise.
    pub fn prefix_for(instant: DateTime<Utc>) -> Self {
        match instant.year() {
            year if year < MIN_YEAR => Self::min(),
            year if year > MAX_YEAR => Self::max(),
            _ => Self(instant.format(KEY_FORMAT).to_string()),
        }
    }

    /// Parses a stored key back into the instant it was encoded from.
    pub fn decode(key: &str) -> Result<DateTime<Utc>, KeyError> {
        let malformed = || KeyError::Malformed(key.to_string());

        if key.len() != KEY_LEN {
            return Err(malformed());
        }
        let body = key.strip_suffix('Z').ok_or_else(malformed)?;
        let instant = NaiveDateTime::parse_from_str(body, PARSE_FORMAT)
            .map_err(|_| malformed())?
            .and_utc();

        // The parser is lenient about digit counts, so only accept the
        // canonical rendering.
        match Self::encode(instant) {
            Ok(canonical) if canonical.as_str() == key => Ok(instant),
            _ => Err(malformed()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn min() -> Self {
        Self("0000-01-01T00:00:00.000000000Z".to_string())
    }

    // Leap second representation, so it also bounds a (theoretical) leap
    // second at the very end of 9999.
    fn max() -> Self {
        Self("9999-12-31T23:59:60.999999999Z".to_string())
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
