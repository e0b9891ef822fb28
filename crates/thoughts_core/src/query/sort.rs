//! Sort field/order selection and the matching comparator.

use super::{QueryError, QueryResult};
use crate::model::thought::Thought;
use std::cmp::Ordering;

/// Field a list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Author,
    /// Accepts both `created_at` and `timestamp` spellings.
    CreatedAt,
}

impl SortField {
    pub fn parse(value: &str) -> QueryResult<Self> {
        match value {
            "id" => Ok(Self::Id),
            "author" => Ok(Self::Author),
            "created_at" | "timestamp" => Ok(Self::CreatedAt),
            _ => Err(QueryError::new(
                "Sort must be one of: id, author, created_at, timestamp",
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Author => "author",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> QueryResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(QueryError::new("Order must be one of: asc, desc")),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Comparator on the primary sort key only.
///
/// Equal keys compare `Equal` in both directions, so a stable sort keeps
/// insertion order for ties.
pub fn comparator_for(
    field: SortField,
    order: SortOrder,
) -> impl Fn(&Thought, &Thought) -> Ordering {
    move |left: &Thought, right: &Thought| {
        let ordering = match field {
            SortField::Id => left.id.cmp(&right.id),
            SortField::Author => left.author.cmp(&right.author),
            SortField::CreatedAt => left.created_at.cmp(&right.created_at),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{comparator_for, SortField, SortOrder};
    use crate::model::thought::Thought;

    fn thought(id: i64, author: &str) -> Thought {
        Thought {
            id,
            text: "sortable".to_string(),
            tags: vec!["sort".to_string()],
            author: author.to_string(),
            created_at: 100,
            updated_at: None,
        }
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let err = SortField::parse("popularity").unwrap_err();
        assert!(err.message().starts_with("Sort must be one of"));
    }

    #[test]
    fn timestamp_is_an_alias_for_created_at() {
        assert_eq!(SortField::parse("timestamp").unwrap(), SortField::CreatedAt);
    }

    #[test]
    fn order_parsing_is_case_insensitive() {
        assert_eq!(SortOrder::parse("DESC").unwrap(), SortOrder::Desc);
        assert!(SortOrder::parse("sideways").is_err());
    }

    #[test]
    fn descending_sort_keeps_insertion_order_for_ties() {
        let mut items = vec![thought(1, "Bob"), thought(2, "Amy"), thought(3, "Bob")];
        let compare = comparator_for(SortField::Author, SortOrder::Desc);
        items.sort_by(|left, right| compare(left, right));
        let ids: Vec<i64> = items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn created_at_ties_fall_back_to_insertion_order() {
        let mut items = vec![thought(2, "x1"), thought(1, "x2")];
        let compare = comparator_for(SortField::CreatedAt, SortOrder::Asc);
        items.sort_by(|left, right| compare(left, right));
        assert_eq!(items[0].id, 2);
    }
}
