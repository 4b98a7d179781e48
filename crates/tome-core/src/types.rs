use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Identifies one detail document: a topic within a bundle.
///
/// Ordered by bundle, then topic, so sets of keys iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DetailKey {
    pub bundle: String,
    pub topic: String,
}

impl DetailKey {
    pub fn new(bundle: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
            topic: topic.into(),
        }
    }
}

impl fmt::Display for DetailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bundle, self.topic)
    }
}

/// Which kind of document a piece of loaded material came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Summary,
    Detail,
}

/// A timestamp in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
