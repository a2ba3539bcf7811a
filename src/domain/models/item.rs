use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A pull request or issue as returned by the search endpoint.
///
/// Only the fields the service relies on are typed; everything else the
/// source sends is kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
