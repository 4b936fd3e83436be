use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Aggregate statistics returned by `/user/stats` or `/admin/stats`.
///
/// The shape is owned by the server; the client only guarantees it is a JSON
/// object and exposes the two well-known keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stats(Map<String, Value>);

impl Stats {
    #[must_use]
    pub fn new(entries: Map<String, Value>) -> Self {
        Self(entries)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn by_subject(&self) -> Option<&Value> {
        self.get("by_subject")
    }

    #[must_use]
    pub fn by_month(&self) -> Option<&Value> {
        self.get("by_month")
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
