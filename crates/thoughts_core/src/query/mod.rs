//! Query-string driven filtering, sorting and paging over thoughts.
//!
//! # Responsibility
//! - Parse string-valued query parameters into typed query options.
//! - Provide the in-memory evaluation both backends must agree with.
//!
//! # Invariants
//! - Absent or blank parameters impose no constraint.
//! - `total` in a page always counts matches before offset/limit.
//! - Sorting is stable; ties keep insertion (id) order.

pub mod filter;
pub mod sort;

use crate::model::thought::Thought;
pub use filter::{build_predicate, Predicate, ThoughtFilter};
pub use sort::{comparator_for, SortField, SortOrder};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QueryResult<T> = Result<T, QueryError>;

/// Malformed query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for QueryError {}

/// Raw string query parameters as received from a caller.
///
/// Lookups return the first occurrence of a key; blank values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Trimmed, non-blank value of the first `name` entry.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Full list request: filter, order and window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThoughtQuery {
    pub filter: ThoughtFilter,
    pub sort: SortField,
    pub order: SortOrder,
    /// Maximum items returned; `None` means unbounded.
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ThoughtQuery {
    /// Parses `tag`, `author`, `min_tags`, `q`, `sort`, `order`, `limit`, `offset`.
    pub fn from_params(params: &QueryParams) -> QueryResult<Self> {
        Ok(Self {
            filter: ThoughtFilter::from_params(params)?,
            sort: params
                .get("sort")
                .map(SortField::parse)
                .transpose()?
                .unwrap_or_default(),
            order: params
                .get("order")
                .map(SortOrder::parse)
                .transpose()?
                .unwrap_or_default(),
            limit: parse_count(params, "limit")?,
            offset: parse_count(params, "offset")?.unwrap_or(0),
        })
    }

    /// Evaluates this query over records held in insertion order.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a Thought>) -> ThoughtPage {
        let mut matched: Vec<&Thought> = records
            .into_iter()
            .filter(|thought| self.filter.matches(thought))
            .collect();
        let compare = comparator_for(self.sort, self.order);
        matched.sort_by(|left, right| compare(left, right));

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        ThoughtPage { items, total }
    }
}

/// One window of a list result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThoughtPage {
    pub items: Vec<Thought>,
    /// Number of matches before offset/limit were applied.
    pub total: usize,
}

/// Parses a non-negative integer parameter.
pub(crate) fn parse_count(params: &QueryParams, name: &str) -> QueryResult<Option<usize>> {
    let Some(raw) = params.get(name) else {
        return Ok(None);
    };
    let value = raw
        .parse::<i64>()
        .map_err(|_| QueryError::new(format!("Query parameter '{name}' must be a number")))?;
    usize::try_from(value)
        .map(Some)
        .map_err(|_| QueryError::new(format!("Query parameter '{name}' must not be negative")))
}

#[cfg(test)]
mod tests {
    use super::{QueryParams, SortField, SortOrder, ThoughtQuery};
    use crate::model::thought::Thought;

    fn thought(id: i64, author: &str, created_at: i64) -> Thought {
        Thought {
            id,
            text: format!("thought number {id}"),
            tags: vec!["flask".to_string()],
            author: author.to_string(),
            created_at,
            updated_at: None,
        }
    }

    #[test]
    fn defaults_are_id_ascending_and_unbounded() {
        let query = ThoughtQuery::from_params(&QueryParams::new()).unwrap();
        assert_eq!(query.sort, SortField::Id);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn first_occurrence_wins_and_blank_reads_as_absent() {
        let params = QueryParams::from_pairs([("limit", "2"), ("limit", "9"), ("tag", "  ")]);
        assert_eq!(params.get("limit"), Some("2"));
        assert_eq!(params.get("tag"), None);
    }

    #[test]
    fn non_numeric_limit_mentions_number() {
        let params = QueryParams::from_pairs([("limit", "abc")]);
        let err = ThoughtQuery::from_params(&params).unwrap_err();
        assert!(err.message().contains("number"));
    }

    #[test]
    fn negative_offset_is_rejected() {
        let params = QueryParams::from_pairs([("offset", "-3")]);
        let err = ThoughtQuery::from_params(&params).unwrap_err();
        assert!(err.message().contains("must not be negative"));
    }

    #[test]
    fn apply_reports_total_before_window() {
        let records = vec![
            thought(1, "Bob", 30),
            thought(2, "alice", 10),
            thought(3, "Alice", 20),
        ];
        let params = QueryParams::from_pairs([("sort", "author"), ("limit", "2")]);
        let page = ThoughtQuery::from_params(&params).unwrap().apply(&records);

        assert_eq!(page.total, 3);
        let ids: Vec<i64> = page.items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn limit_zero_returns_no_items() {
        let records = vec![thought(1, "Bob", 30)];
        let params = QueryParams::from_pairs([("limit", "0")]);
        let page = ThoughtQuery::from_params(&params).unwrap().apply(&records);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }
}
