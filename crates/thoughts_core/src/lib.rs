//! Core domain logic for the thought-of-the-day store.
//! Validation, querying and persistence rules all live in this crate.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{Backend, ConfigError, CoreConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::thought::{Clock, NewThought, SystemClock, Thought, ThoughtChanges, ThoughtId};
pub use model::validation::{validate, ErrorMode, Validation, ValidationPolicy};
pub use query::filter::{build_predicate, ThoughtFilter};
pub use query::sort::{comparator_for, SortField, SortOrder};
pub use query::{QueryError, QueryParams, ThoughtPage, ThoughtQuery};
pub use repo::memory_repo::MemoryThoughtRepository;
pub use repo::sqlite_repo::SqliteThoughtRepository;
pub use repo::{RepoError, RepoResult, StoreHealth, ThoughtRepository, ThoughtStats};
pub use service::thought_service::ThoughtService;
pub use service::{ErrorBody, ServiceError, ServiceResult};

/// Minimal health-check API for wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
