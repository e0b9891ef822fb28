//! In-memory thought storage.
//!
//! # Responsibility
//! - Hold thoughts in insertion order with a monotonic id allocator.
//!
//! # Invariants
//! - `next_id` only grows; deleting the newest thought does not free its id.
//! - Mutating methods take `&mut self`; hosts sharing one store across
//!   threads must wrap it (or the owning service) in a `Mutex`.

use crate::model::thought::{NewThought, Thought, ThoughtChanges, ThoughtId};
use crate::query::{ThoughtFilter, ThoughtPage, ThoughtQuery};
use crate::repo::{RepoError, RepoResult, StoreHealth, ThoughtRepository, ThoughtStats};

const FIRST_ID: ThoughtId = 1;

/// Vec-backed repository for tests and ephemeral runs.
#[derive(Debug, Clone)]
pub struct MemoryThoughtRepository {
    records: Vec<Thought>,
    next_id: ThoughtId,
}

impl Default for MemoryThoughtRepository {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: FIRST_ID,
        }
    }
}

impl MemoryThoughtRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn allocate(&mut self, draft: &NewThought, now: i64) -> Thought {
        let id = self.next_id;
        self.next_id += 1;
        Thought {
            id,
            text: draft.text.clone(),
            tags: draft.tags.clone(),
            author: draft.author.clone(),
            created_at: now,
            updated_at: None,
        }
    }

    fn position(&self, id: ThoughtId) -> RepoResult<usize> {
        self.records
            .iter()
            .position(|thought| thought.id == id)
            .ok_or(RepoError::NotFound(id))
    }
}

impl ThoughtRepository for MemoryThoughtRepository {
    fn create(&mut self, draft: &NewThought, now: i64) -> RepoResult<Thought> {
        let thought = self.allocate(draft, now);
        self.records.push(thought.clone());
        Ok(thought)
    }

    fn create_bulk(&mut self, drafts: &[NewThought], now: i64) -> RepoResult<Vec<Thought>> {
        let created: Vec<Thought> = drafts
            .iter()
            .map(|draft| self.allocate(draft, now))
            .collect();
        self.records.extend(created.iter().cloned());
        Ok(created)
    }

    fn get_by_id(&self, id: ThoughtId) -> RepoResult<Option<Thought>> {
        Ok(self.records.iter().find(|thought| thought.id == id).cloned())
    }

    fn list(&self, query: &ThoughtQuery) -> RepoResult<ThoughtPage> {
        Ok(query.apply(&self.records))
    }

    fn update(
        &mut self,
        id: ThoughtId,
        changes: &ThoughtChanges,
        now: i64,
    ) -> RepoResult<Thought> {
        let index = self.position(id)?;
        let thought = &mut self.records[index];
        thought.apply(changes, now);
        Ok(thought.clone())
    }

    fn delete(&mut self, id: ThoughtId) -> RepoResult<Thought> {
        let index = self.position(id)?;
        Ok(self.records.remove(index))
    }

    fn count(&self, filter: &ThoughtFilter) -> RepoResult<usize> {
        Ok(self
            .records
            .iter()
            .filter(|thought| filter.matches(thought))
            .count())
    }

    fn delete_by_tag(&mut self, tag: &str) -> RepoResult<usize> {
        let before = self.records.len();
        self.records
            .retain(|thought| !thought.tags.iter().any(|item| item == tag));
        Ok(before - self.records.len())
    }

    fn stats(&self) -> RepoResult<ThoughtStats> {
        Ok(ThoughtStats::from_thoughts(&self.records))
    }

    fn health(&self) -> RepoResult<StoreHealth> {
        Ok(StoreHealth {
            backend: "memory",
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryThoughtRepository;
    use crate::model::thought::NewThought;
    use crate::repo::ThoughtRepository;

    fn draft(text: &str) -> NewThought {
        NewThought::new(text, vec!["memo".to_string()], None)
    }

    #[test]
    fn ids_are_not_reused_after_deleting_the_newest() {
        let mut repo = MemoryThoughtRepository::new();
        repo.create(&draft("first one"), 1).unwrap();
        let second = repo.create(&draft("second one"), 2).unwrap();
        repo.delete(second.id).unwrap();

        let third = repo.create(&draft("third one"), 3).unwrap();
        assert_eq!(third.id, 3);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn delete_by_tag_reports_removed_count() {
        let mut repo = MemoryThoughtRepository::new();
        repo.create(&draft("tagged one"), 1).unwrap();
        repo.create(
            &NewThought::new("other one", vec!["misc".to_string()], None),
            2,
        )
        .unwrap();

        assert_eq!(repo.delete_by_tag("memo").unwrap(), 1);
        assert_eq!(repo.len(), 1);
    }
}
