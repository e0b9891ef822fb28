//! Filter predicate built from query parameters.

use super::{parse_count, QueryParams, QueryResult};
use crate::model::thought::Thought;

/// Boxed predicate over thought records.
pub type Predicate = Box<dyn Fn(&Thought) -> bool + Send + Sync>;

/// Conjunction of optional constraints; `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThoughtFilter {
    /// Exact, case-sensitive membership in `tags`.
    pub tag: Option<String>,
    /// Case-insensitive substring of `author`.
    pub author: Option<String>,
    /// Minimum number of tags.
    pub min_tags: Option<usize>,
    /// Case-insensitive substring of `text` (`q` parameter).
    pub text: Option<String>,
}

impl ThoughtFilter {
    pub fn from_params(params: &QueryParams) -> QueryResult<Self> {
        Ok(Self {
            tag: params.get("tag").map(str::to_string),
            author: params.get("author").map(str::to_string),
            min_tags: parse_count(params, "min_tags")?,
            text: params.get("q").map(str::to_string),
        })
    }

    pub fn by_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, thought: &Thought) -> bool {
        let tag_ok = self
            .tag
            .as_deref()
            .map_or(true, |tag| thought.tags.iter().any(|item| item == tag));
        let author_ok = self
            .author
            .as_deref()
            .map_or(true, |needle| contains_ignore_case(&thought.author, needle));
        let min_tags_ok = self
            .min_tags
            .map_or(true, |min| thought.tags.len() >= min);
        let text_ok = self
            .text
            .as_deref()
            .map_or(true, |needle| contains_ignore_case(&thought.text, needle));

        tag_ok && author_ok && min_tags_ok && text_ok
    }

    /// Owned predicate equivalent to [`ThoughtFilter::matches`].
    pub fn into_predicate(self) -> Predicate {
        Box::new(move |thought: &Thought| self.matches(thought))
    }
}

/// Parses filter parameters and returns the combined predicate.
pub fn build_predicate(params: &QueryParams) -> QueryResult<Predicate> {
    ThoughtFilter::from_params(params).map(ThoughtFilter::into_predicate)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.to_lowercase())
}
