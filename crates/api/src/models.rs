use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message held in a cubby.
///
/// Serialized as `{"time": "<RFC 3339>", "message": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// When the store accepted the message.
    pub time: DateTime<Utc>,
    #[serde(rename = "message")]
    pub content: String,
}
