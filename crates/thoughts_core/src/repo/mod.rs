//! Storage backends for thoughts.
//!
//! # Responsibility
//! - Define the storage contract shared by every backend.
//! - Keep SQL and collection details out of the service layer.
//!
//! # Invariants
//! - Inputs are already validated and trimmed; backends never re-validate.
//! - Mutations are all-or-nothing: a failed call leaves storage untouched.
//! - Ids are allocated monotonically and never reused after delete.

pub mod memory_repo;
pub mod sqlite_repo;

use crate::db::DbError;
use crate::model::thought::{NewThought, Thought, ThoughtChanges, ThoughtId};
use crate::query::{ThoughtFilter, ThoughtPage, ThoughtQuery};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure.
#[derive(Debug)]
pub enum RepoError {
    NotFound(ThoughtId),
    Db(DbError),
    /// Store could not be reached at all.
    Connection(String),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "thought not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Connection(message) => write!(f, "store unreachable: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted thought data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_connection_failure() {
            Self::Connection(value.to_string())
        } else {
            Self::Db(value)
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::Sqlite(value).into()
    }
}

/// Number of thoughts carrying one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Aggregate numbers over the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThoughtStats {
    pub total_thoughts: usize,
    pub unique_authors: usize,
    pub unique_tags: usize,
    /// Sorted by count descending, then tag ascending.
    pub tag_counts: Vec<TagCount>,
    /// Newest `created_at`, if any thought exists.
    pub latest_timestamp: Option<i64>,
}

impl ThoughtStats {
    pub fn from_thoughts<'a>(thoughts: impl IntoIterator<Item = &'a Thought>) -> Self {
        let mut total_thoughts = 0;
        let mut authors = BTreeSet::new();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut latest_timestamp = None;

        for thought in thoughts {
            total_thoughts += 1;
            authors.insert(thought.author.as_str());
            let distinct: BTreeSet<&str> = thought.tags.iter().map(String::as_str).collect();
            for tag in distinct {
                *counts.entry(tag).or_default() += 1;
            }
            latest_timestamp = latest_timestamp.max(Some(thought.created_at));
        }

        let tag_counts = counts
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        Self::new(total_thoughts, authors.len(), tag_counts, latest_timestamp)
    }

    pub(crate) fn new(
        total_thoughts: usize,
        unique_authors: usize,
        mut tag_counts: Vec<TagCount>,
        latest_timestamp: Option<i64>,
    ) -> Self {
        tag_counts.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.tag.cmp(&right.tag))
        });
        Self {
            total_thoughts,
            unique_authors,
            unique_tags: tag_counts.len(),
            tag_counts,
            latest_timestamp,
        }
    }
}

/// Reachability report for the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub version: String,
}

/// Storage contract implemented by every backend.
///
/// Backends are selected at composition time; the service layer is generic
/// over this trait.
pub trait ThoughtRepository {
    /// Persists one thought with a fresh id and `updated_at = None`.
    fn create(&mut self, draft: &NewThought, now: i64) -> RepoResult<Thought>;
    /// Persists every draft or none of them.
    fn create_bulk(&mut self, drafts: &[NewThought], now: i64) -> RepoResult<Vec<Thought>>;
    fn get_by_id(&self, id: ThoughtId) -> RepoResult<Option<Thought>>;
    /// Filters, sorts and windows stored thoughts.
    fn list(&self, query: &ThoughtQuery) -> RepoResult<ThoughtPage>;
    /// Merges `changes` into an existing thought and stamps `updated_at`.
    fn update(
        &mut self,
        id: ThoughtId,
        changes: &ThoughtChanges,
        now: i64,
    ) -> RepoResult<Thought>;
    /// Removes one thought and returns its last state.
    fn delete(&mut self, id: ThoughtId) -> RepoResult<Thought>;
    fn count(&self, filter: &ThoughtFilter) -> RepoResult<usize>;
    /// Removes every thought carrying `tag`; returns how many were removed.
    fn delete_by_tag(&mut self, tag: &str) -> RepoResult<usize>;
    fn stats(&self) -> RepoResult<ThoughtStats>;
    fn health(&self) -> RepoResult<StoreHealth>;
}

#[cfg(test)]
mod tests {
    use super::ThoughtStats;
    use crate::model::thought::Thought;

    #[test]
    fn stats_count_each_tag_once_per_thought() {
        let thoughts = vec![
            Thought {
                id: 1,
                text: "first thought".to_string(),
                tags: vec!["api".to_string(), "api".to_string(), "flask".to_string()],
                author: "Alice".to_string(),
                created_at: 10,
                updated_at: None,
            },
            Thought {
                id: 2,
                text: "second thought".to_string(),
                tags: vec!["flask".to_string()],
                author: "Alice".to_string(),
                created_at: 30,
                updated_at: None,
            },
        ];

        let stats = ThoughtStats::from_thoughts(&thoughts);
        assert_eq!(stats.total_thoughts, 2);
        assert_eq!(stats.unique_authors, 1);
        assert_eq!(stats.unique_tags, 2);
        assert_eq!(stats.tag_counts[0].tag, "flask");
        assert_eq!(stats.tag_counts[0].count, 2);
        assert_eq!(stats.tag_counts[1].count, 1);
        assert_eq!(stats.latest_timestamp, Some(30));
    }
}
