//! Validation rules for candidate thought bodies.
//!
//! # Responsibility
//! - Check an untyped request body against text/tags/author constraints.
//! - Extract trimmed, typed fields once a body passes.
//!
//! # Invariants
//! - Validation is pure: no storage access, no logging.
//! - `partial = true` only relaxes presence rules, never shape/length rules.
//! - Lengths are measured in Unicode scalar values after trimming.

use crate::model::thought::{NewThought, ThoughtChanges, DEFAULT_AUTHOR};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const TEXT_MIN_CHARS: usize = 5;
pub const TEXT_MAX_CHARS: usize = 280;
pub const TAGS_MIN_COUNT: usize = 1;
pub const TAGS_MAX_COUNT: usize = 5;
pub const TAG_MIN_CHARS: usize = 2;
pub const TAG_MAX_CHARS: usize = 20;

static TAG_CHARSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("valid tag charset regex"));

/// How many violations a single validation pass reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Evaluate every rule and report all violations.
    #[default]
    CollectAll,
    /// Stop at the first violation.
    FailFast,
}

/// Tunable parts of the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub mode: ErrorMode,
    /// Reject exact (case-sensitive) duplicate tags within one thought.
    pub reject_duplicate_tags: bool,
    /// Restrict tags to ASCII alphanumerics and `-`.
    pub restrict_tag_charset: bool,
}

impl ValidationPolicy {
    /// Every optional check enabled, all violations collected.
    pub const fn strict() -> Self {
        Self {
            mode: ErrorMode::CollectAll,
            reject_duplicate_tags: true,
            restrict_tag_charset: true,
        }
    }

    /// Only the mandatory length/type/cardinality rules.
    pub const fn lenient() -> Self {
        Self {
            mode: ErrorMode::CollectAll,
            reject_duplicate_tags: false,
            restrict_tag_charset: false,
        }
    }

    pub const fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(Vec<String>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Violation messages in rule order; empty when valid.
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<(), Vec<String>> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// Trimmed fields extracted from a body that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThoughtFields {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
}

impl ThoughtFields {
    /// Builds a create input; `None` when a required field is missing.
    pub fn into_new_thought(self) -> Option<NewThought> {
        Some(NewThought::new(self.text?, self.tags?, self.author))
    }

    pub fn into_changes(self) -> ThoughtChanges {
        ThoughtChanges {
            text: self.text,
            tags: self.tags,
            author: self.author,
        }
    }
}

/// Checks `candidate` against the rule set.
///
/// `partial` marks merge-style updates where `text` and `tags` may be absent.
pub fn validate(candidate: &Value, partial: bool, policy: &ValidationPolicy) -> Validation {
    let body = match body_object(candidate) {
        Ok(body) => body,
        Err(message) => return Validation::Invalid(vec![message.to_string()]),
    };

    let mut report = Report::new(policy.mode);
    check_text(body.get("text"), partial, &mut report);
    if !report.halted() {
        check_tags(body.get("tags"), partial, policy, &mut report);
    }
    if !report.halted() {
        check_author(body.get("author"), &mut report);
    }
    report.finish()
}

/// Validates `candidate` and returns its trimmed fields.
pub fn parse_thought(
    candidate: &Value,
    partial: bool,
    policy: &ValidationPolicy,
) -> Result<ThoughtFields, Vec<String>> {
    validate(candidate, partial, policy).into_result()?;

    // Shape was checked above, so the lookups below cannot disagree with it.
    let body = candidate.as_object().cloned().unwrap_or_default();
    let text = body
        .get("text")
        .and_then(Value::as_str)
        .map(|value| value.trim().to_string());
    let tags = body.get("tags").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(|tag| tag.trim().to_string())
            .collect::<Vec<_>>()
    });
    let author = body
        .get("author")
        .and_then(Value::as_str)
        .map(normalize_author);

    Ok(ThoughtFields { text, tags, author })
}

/// Trims an author name, falling back to the default for blank input.
pub fn normalize_author(author: &str) -> String {
    let trimmed = author.trim();
    if trimmed.is_empty() {
        DEFAULT_AUTHOR.to_string()
    } else {
        trimmed.to_string()
    }
}

fn body_object(candidate: &Value) -> Result<&Map<String, Value>, &'static str> {
    match candidate {
        Value::Null => Err("Request body is required"),
        Value::Object(body) if body.is_empty() => Err("Request body is required"),
        Value::Object(body) => Ok(body),
        _ => Err("Request body must be a JSON object"),
    }
}

fn check_text(value: Option<&Value>, partial: bool, report: &mut Report) {
    let Some(value) = value else {
        if !partial {
            report.push("Field 'text' is required");
        }
        return;
    };
    let Some(text) = value.as_str() else {
        report.push("Field 'text' must be a string");
        return;
    };

    let chars = text.trim().chars().count();
    if chars < TEXT_MIN_CHARS {
        report.push(format!(
            "Field 'text' must be at least {TEXT_MIN_CHARS} characters long"
        ));
    } else if chars > TEXT_MAX_CHARS {
        report.push(format!(
            "Field 'text' must not exceed {TEXT_MAX_CHARS} characters"
        ));
    }
}

fn check_tags(
    value: Option<&Value>,
    partial: bool,
    policy: &ValidationPolicy,
    report: &mut Report,
) {
    let Some(value) = value else {
        if !partial {
            report.push("Field 'tags' is required");
        }
        return;
    };
    let Some(items) = value.as_array() else {
        report.push("Field 'tags' must be an array");
        return;
    };

    if items.len() < TAGS_MIN_COUNT {
        report.push("At least one tag is required");
    } else if items.len() > TAGS_MAX_COUNT {
        report.push(format!("Maximum {TAGS_MAX_COUNT} tags allowed"));
    }
    if report.halted() {
        return;
    }

    if policy.reject_duplicate_tags {
        let mut seen = HashSet::new();
        let has_duplicate = items
            .iter()
            .filter_map(Value::as_str)
            .any(|tag| !seen.insert(tag.trim()));
        if has_duplicate {
            report.push("Duplicate tags are not allowed");
            if report.halted() {
                return;
            }
        }
    }

    for item in items {
        let Some(tag) = item.as_str() else {
            report.push_once("All tags must be strings");
            if report.halted() {
                return;
            }
            continue;
        };

        let trimmed = tag.trim();
        let chars = trimmed.chars().count();
        if chars < TAG_MIN_CHARS {
            report.push_once(format!(
                "Each tag must be at least {TAG_MIN_CHARS} characters long"
            ));
        } else if chars > TAG_MAX_CHARS {
            report.push_once(format!(
                "Each tag must not exceed {TAG_MAX_CHARS} characters"
            ));
        }
        if report.halted() {
            return;
        }

        if policy.restrict_tag_charset && !trimmed.is_empty() && !TAG_CHARSET_RE.is_match(trimmed)
        {
            report.push_once("Tags must contain only alphanumeric characters and hyphens");
            if report.halted() {
                return;
            }
        }
    }
}

fn check_author(value: Option<&Value>, report: &mut Report) {
    if let Some(value) = value {
        if !value.is_string() {
            report.push("Field 'author' must be a string");
        }
    }
}

struct Report {
    mode: ErrorMode,
    errors: Vec<String>,
}

impl Report {
    fn new(mode: ErrorMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Per-tag rules report each kind of violation once per body.
    fn push_once(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.errors.contains(&message) {
            self.errors.push(message);
        }
    }

    fn halted(&self) -> bool {
        self.mode == ErrorMode::FailFast && !self.errors.is_empty()
    }

    fn finish(self) -> Validation {
        if self.errors.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_author, parse_thought, validate, ErrorMode, ValidationPolicy};
    use serde_json::json;

    #[test]
    fn empty_object_and_null_short_circuit_with_body_required() {
        let policy = ValidationPolicy::default();
        for body in [json!(null), json!({})] {
            let outcome = validate(&body, false, &policy);
            assert_eq!(outcome.errors(), ["Request body is required"]);
        }
    }

    #[test]
    fn non_object_body_is_rejected() {
        let outcome = validate(&json!(["text"]), false, &ValidationPolicy::default());
        assert_eq!(outcome.errors(), ["Request body must be a JSON object"]);
    }

    #[test]
    fn collect_all_reports_every_violation() {
        let body = json!({ "text": "Hi", "tags": [] , "author": 7 });
        let outcome = validate(&body, false, &ValidationPolicy::default());
        assert_eq!(
            outcome.errors(),
            [
                "Field 'text' must be at least 5 characters long",
                "At least one tag is required",
                "Field 'author' must be a string",
            ]
        );
    }

    #[test]
    fn fail_fast_stops_at_first_violation() {
        let body = json!({ "text": "Hi", "tags": [] });
        let policy = ValidationPolicy::default().with_mode(ErrorMode::FailFast);
        let outcome = validate(&body, false, &policy);
        assert_eq!(
            outcome.errors(),
            ["Field 'text' must be at least 5 characters long"]
        );
    }

    #[test]
    fn per_tag_violations_are_reported_once_each() {
        let body = json!({ "text": "valid text", "tags": ["a", "b", 3] });
        let outcome = validate(&body, false, &ValidationPolicy::lenient());
        assert_eq!(
            outcome.errors(),
            [
                "Each tag must be at least 2 characters long",
                "All tags must be strings",
            ]
        );
    }

    #[test]
    fn optional_checks_follow_policy() {
        let body = json!({ "text": "valid text", "tags": ["rust", "rust", "no spaces"] });

        let strict = validate(&body, false, &ValidationPolicy::strict());
        assert!(strict
            .errors()
            .contains(&"Duplicate tags are not allowed".to_string()));
        assert!(strict
            .errors()
            .contains(&"Tags must contain only alphanumeric characters and hyphens".to_string()));

        assert!(validate(&body, false, &ValidationPolicy::lenient()).is_valid());
    }

    #[test]
    fn text_length_is_counted_after_trimming() {
        let policy = ValidationPolicy::default();
        let padded = json!({ "text": "   abcd   ", "tags": ["ok"] });
        assert!(!validate(&padded, false, &policy).is_valid());

        let exact_max = json!({ "text": format!("  {}  ", "x".repeat(280)), "tags": ["ok"] });
        assert!(validate(&exact_max, false, &policy).is_valid());
    }

    #[test]
    fn partial_allows_missing_fields_but_keeps_shape_rules() {
        let policy = ValidationPolicy::default();
        assert!(validate(&json!({ "text": "Flask is still great" }), true, &policy).is_valid());
        assert_eq!(
            validate(&json!({ "tags": "flask" }), true, &policy).errors(),
            ["Field 'tags' must be an array"]
        );
    }

    #[test]
    fn parse_thought_trims_fields_and_defaults_blank_author() {
        let body = json!({ "text": "  spaced out  ", "tags": [" api ", "flask"], "author": "  " });
        let fields = parse_thought(&body, false, &ValidationPolicy::default()).unwrap();
        assert_eq!(fields.text.as_deref(), Some("spaced out"));
        assert_eq!(fields.tags, Some(vec!["api".to_string(), "flask".to_string()]));
        assert_eq!(fields.author.as_deref(), Some("Anonymous"));
    }

    #[test]
    fn normalize_author_keeps_named_authors() {
        assert_eq!(normalize_author(" Alice "), "Alice");
    }
}
