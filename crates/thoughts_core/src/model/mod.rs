//! Domain model for thoughts.
//!
//! # Responsibility
//! - Define the canonical thought record and its write-side shapes.
//! - Own the validation rules every write path goes through.
//!
//! # Invariants
//! - Every thought is identified by a store-assigned `ThoughtId`.
//! - Stored text/tags/author are always trimmed.

pub mod thought;
pub mod validation;
