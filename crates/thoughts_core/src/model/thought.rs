//! Thought domain model.
//!
//! # Responsibility
//! - Define the persisted record and its public serialized shape.
//! - Define the validated inputs repositories accept.
//!
//! # Invariants
//! - `id` is assigned once by the store and never reused.
//! - `created_at` is set once; `updated_at` stays `None` until the first
//!   mutation and is refreshed by every later one.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned, monotonically increasing identifier.
pub type ThoughtId = i64;

/// Author recorded when the caller does not name one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// A short text annotated with tags and authorship metadata.
///
/// Serializes to `{id, text, tags, author, timestamp, updated_at}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    pub id: ThoughtId,
    pub text: String,
    pub tags: Vec<String>,
    pub author: String,
    /// Creation time in Unix epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub created_at: i64,
    /// Last mutation time in Unix epoch milliseconds.
    pub updated_at: Option<i64>,
}

impl Thought {
    /// Whether the record was mutated after creation.
    pub fn is_modified(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Applies a validated merge set in place and stamps `updated_at`.
    pub fn apply(&mut self, changes: &ThoughtChanges, now: i64) {
        if let Some(text) = &changes.text {
            self.text = text.clone();
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        if let Some(author) = &changes.author {
            self.author = author.clone();
        }
        self.updated_at = Some(now);
    }
}

/// Validated, trimmed input for a brand-new thought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThought {
    pub text: String,
    pub tags: Vec<String>,
    pub author: String,
}

impl NewThought {
    pub fn new(text: impl Into<String>, tags: Vec<String>, author: Option<String>) -> Self {
        Self {
            text: text.into(),
            tags,
            author: author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        }
    }
}

/// Validated merge set for an existing thought.
///
/// `None` fields are left untouched by the update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThoughtChanges {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
}

/// Time source used to stamp `created_at` / `updated_at`.
pub trait Clock {
    /// Current time in Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Thought, ThoughtChanges};

    fn sample() -> Thought {
        Thought {
            id: 1,
            text: "Flask is great today".to_string(),
            tags: vec!["flask".to_string(), "api".to_string()],
            author: "Anonymous".to_string(),
            created_at: 1_000,
            updated_at: None,
        }
    }

    #[test]
    fn serializes_created_at_as_timestamp() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["timestamp"], 1_000);
        assert!(value["updated_at"].is_null());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut thought = sample();
        let changes = ThoughtChanges {
            text: Some("Flask is still great".to_string()),
            ..ThoughtChanges::default()
        };
        thought.apply(&changes, 2_000);

        assert_eq!(thought.text, "Flask is still great");
        assert_eq!(thought.tags, vec!["flask", "api"]);
        assert_eq!(thought.updated_at, Some(2_000));
        assert!(thought.is_modified());
    }
}
