//! Thought use-case service.
//!
//! # Responsibility
//! - Validate raw bodies, parse query strings and stamp timestamps before
//!   delegating to a repository backend.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - Every mutation is validated before storage is touched.
//! - A failed call never leaves a partial write behind.
//! - Log events carry ids and counts only, never thought text.

use crate::model::thought::{Clock, NewThought, SystemClock, Thought, ThoughtId};
use crate::model::validation::{parse_thought, ValidationPolicy};
use crate::query::{QueryParams, ThoughtFilter, ThoughtPage, ThoughtQuery};
use crate::repo::{StoreHealth, ThoughtRepository, ThoughtStats};
use crate::service::{ServiceError, ServiceResult};
use log::{error, info};
use serde_json::Value;

/// Largest batch `create_bulk` accepts.
pub const BULK_CREATE_MAX: usize = 100;

/// Facade over one repository backend.
///
/// Mutating calls take `&mut self`; multi-threaded hosts share the service
/// behind a `Mutex`.
pub struct ThoughtService<R: ThoughtRepository, C: Clock = SystemClock> {
    repo: R,
    policy: ValidationPolicy,
    clock: C,
}

impl<R: ThoughtRepository> ThoughtService<R> {
    /// Creates a service with the default policy and wall-clock time.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: ThoughtRepository, C: Clock> ThoughtService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            policy: ValidationPolicy::default(),
            clock,
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validates `body` and stores it as a new thought.
    pub fn create(&mut self, body: &Value) -> ServiceResult<Thought> {
        let result = self.create_inner(body);
        match &result {
            Ok(thought) => info!(
                "event=thought_create module=service status=ok id={} tag_count={}",
                thought.id,
                thought.tags.len()
            ),
            Err(err) => log_failure("thought_create", err),
        }
        result
    }

    /// Validates every item of a JSON array, then stores all of them or none.
    pub fn create_bulk(&mut self, body: &Value) -> ServiceResult<Vec<Thought>> {
        let result = self.create_bulk_inner(body);
        match &result {
            Ok(created) => info!(
                "event=thought_create_bulk module=service status=ok count={}",
                created.len()
            ),
            Err(err) => log_failure("thought_create_bulk", err),
        }
        result
    }

    pub fn get_by_id(&self, id: ThoughtId) -> ServiceResult<Thought> {
        let result = self
            .repo
            .get_by_id(id)
            .map_err(ServiceError::from)
            .and_then(|found| found.ok_or(ServiceError::NotFound(id)));
        if let Err(err) = &result {
            log_failure("thought_get", err);
        }
        result
    }

    /// Lists thoughts using `tag`, `author`, `min_tags`, `q`, `sort`,
    /// `order`, `limit` and `offset` parameters.
    pub fn list(&self, params: &QueryParams) -> ServiceResult<ThoughtPage> {
        let result = ThoughtQuery::from_params(params)
            .map_err(ServiceError::from)
            .and_then(|query| self.repo.list(&query).map_err(ServiceError::from));
        match &result {
            Ok(page) => info!(
                "event=thought_list module=service status=ok returned={} total={}",
                page.items.len(),
                page.total
            ),
            Err(err) => log_failure("thought_list", err),
        }
        result
    }

    /// Full replace (`partial = false`) or merge (`partial = true`) update.
    ///
    /// A full replace keeps the stored author when `author` is absent.
    pub fn update(&mut self, id: ThoughtId, body: &Value, partial: bool) -> ServiceResult<Thought> {
        let result = self.update_inner(id, body, partial);
        match &result {
            Ok(thought) => info!(
                "event=thought_update module=service status=ok id={} partial={}",
                thought.id, partial
            ),
            Err(err) => log_failure("thought_update", err),
        }
        result
    }

    /// Removes one thought and returns its last state.
    pub fn delete(&mut self, id: ThoughtId) -> ServiceResult<Thought> {
        let result = self.repo.delete(id).map_err(ServiceError::from);
        match &result {
            Ok(thought) => info!(
                "event=thought_delete module=service status=ok id={}",
                thought.id
            ),
            Err(err) => log_failure("thought_delete", err),
        }
        result
    }

    /// Counts thoughts matching the filter parameters of `params`.
    pub fn count(&self, params: &QueryParams) -> ServiceResult<usize> {
        let result = ThoughtFilter::from_params(params)
            .map_err(ServiceError::from)
            .and_then(|filter| self.repo.count(&filter).map_err(ServiceError::from));
        if let Err(err) = &result {
            log_failure("thought_count", err);
        }
        result
    }

    /// Removes every thought carrying `tag`.
    pub fn delete_by_tag(&mut self, tag: &str) -> ServiceResult<usize> {
        let tag = tag.trim();
        let result = if tag.is_empty() {
            Err(ServiceError::validation("Query parameter 'tag' is required"))
        } else {
            self.repo.delete_by_tag(tag).map_err(ServiceError::from)
        };
        match &result {
            Ok(removed) => info!(
                "event=thought_delete_by_tag module=service status=ok removed={removed}"
            ),
            Err(err) => log_failure("thought_delete_by_tag", err),
        }
        result
    }

    pub fn stats(&self) -> ServiceResult<ThoughtStats> {
        let result = self.repo.stats().map_err(ServiceError::from);
        if let Err(err) = &result {
            log_failure("thought_stats", err);
        }
        result
    }

    /// Probes the backing store; unreachable storage surfaces as
    /// [`ServiceError::Connection`].
    pub fn health(&self) -> ServiceResult<StoreHealth> {
        let result = self.repo.health().map_err(ServiceError::from);
        match &result {
            Ok(health) => info!(
                "event=store_health module=service status=ok backend={}",
                health.backend
            ),
            Err(err) => log_failure("store_health", err),
        }
        result
    }

    /// Inserts the sample thoughts when the store is empty.
    ///
    /// Returns how many thoughts were inserted.
    pub fn seed_samples(&mut self) -> ServiceResult<usize> {
        if self.repo.count(&ThoughtFilter::default())? > 0 {
            return Ok(0);
        }

        let now = self.clock.now_ms();
        let created = self.repo.create_bulk(&sample_thoughts(), now)?;
        info!(
            "event=thought_seed module=service status=ok count={}",
            created.len()
        );
        Ok(created.len())
    }

    fn create_inner(&mut self, body: &Value) -> ServiceResult<Thought> {
        let draft = self.parse_new(body)?;
        let now = self.clock.now_ms();
        Ok(self.repo.create(&draft, now)?)
    }

    fn create_bulk_inner(&mut self, body: &Value) -> ServiceResult<Vec<Thought>> {
        let items = body
            .as_array()
            .ok_or_else(|| ServiceError::validation("Request body must be a JSON array"))?;
        if items.is_empty() {
            return Err(ServiceError::validation("Thoughts list cannot be empty"));
        }
        if items.len() > BULK_CREATE_MAX {
            return Err(ServiceError::validation(format!(
                "Cannot create more than {BULK_CREATE_MAX} thoughts at once"
            )));
        }

        let mut drafts = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let draft = self.parse_new(item).map_err(|err| match err {
                ServiceError::Validation(errors) => ServiceError::validation(format!(
                    "Thought at index {index}: {}",
                    errors.join("; ")
                )),
                other => other,
            })?;
            drafts.push(draft);
        }

        let now = self.clock.now_ms();
        Ok(self.repo.create_bulk(&drafts, now)?)
    }

    fn update_inner(&mut self, id: ThoughtId, body: &Value, partial: bool) -> ServiceResult<Thought> {
        if self.repo.get_by_id(id)?.is_none() {
            return Err(ServiceError::NotFound(id));
        }

        let changes = parse_thought(body, partial, &self.policy)
            .map_err(ServiceError::Validation)?
            .into_changes();
        let now = self.clock.now_ms();
        Ok(self.repo.update(id, &changes, now)?)
    }

    fn parse_new(&self, body: &Value) -> ServiceResult<NewThought> {
        parse_thought(body, false, &self.policy)
            .map_err(ServiceError::Validation)?
            .into_new_thought()
            .ok_or_else(|| ServiceError::validation("Fields 'text' and 'tags' are required"))
    }
}

fn sample_thoughts() -> Vec<NewThought> {
    let sample = |text: &str, tags: &[&str], author: &str| {
        NewThought::new(
            text,
            tags.iter().map(|tag| tag.to_string()).collect(),
            Some(author.to_string()),
        )
    };
    vec![
        sample(
            "Rust with SQLite is powerful!",
            &["rust", "sqlite", "storage"],
            "Course Instructor",
        ),
        sample(
            "Docker makes development environments consistent",
            &["docker", "devops", "development"],
            "DevOps Engineer",
        ),
        sample(
            "APIs are the backbone of modern applications",
            &["api", "architecture", "backend"],
            "API Developer",
        ),
    ]
}

fn log_failure(event: &str, err: &ServiceError) {
    match err {
        ServiceError::Validation(errors) => info!(
            "event={event} module=service status=rejected error_code=validation violations={}",
            errors.len()
        ),
        ServiceError::NotFound(id) => info!(
            "event={event} module=service status=rejected error_code=not_found id={id}"
        ),
        ServiceError::Database(source) => error!(
            "event={event} module=service status=error error_code=database error={source}"
        ),
        ServiceError::Connection(message) => error!(
            "event={event} module=service status=error error_code=connection error={message}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{sample_thoughts, ThoughtService};
    use crate::model::validation::{validate, ValidationPolicy};
    use crate::repo::memory_repo::MemoryThoughtRepository;
    use serde_json::json;

    #[test]
    fn sample_thoughts_pass_strict_validation() {
        for draft in sample_thoughts() {
            let body = json!({ "text": draft.text, "tags": draft.tags, "author": draft.author });
            assert!(validate(&body, false, &ValidationPolicy::strict()).is_valid());
        }
    }

    #[test]
    fn seed_samples_only_fills_an_empty_store() {
        let mut service = ThoughtService::new(MemoryThoughtRepository::new());
        assert_eq!(service.seed_samples().unwrap(), 3);
        assert_eq!(service.seed_samples().unwrap(), 0);
        assert_eq!(service.repository().len(), 3);
    }
}
