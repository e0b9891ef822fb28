//! Core use-case services.
//!
//! # Responsibility
//! - Turn raw request bodies and query strings into validated repository calls.
//! - Map every failure onto the caller-facing `{code, message}` taxonomy.

pub mod thought_service;

use crate::model::thought::ThoughtId;
use crate::query::QueryError;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing failure of a thought use-case.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller data broke one or more rules; messages are in rule order.
    Validation(Vec<String>),
    /// Referenced thought does not exist.
    NotFound(ThoughtId),
    /// Storage failed; details stay in logs.
    Database(RepoError),
    /// Storage could not be reached.
    Connection(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// HTTP-style status the outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Database(_) | Self::Connection(_) => 500,
        }
    }

    /// Message safe to hand back to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.join("; "),
            Self::NotFound(id) => format!("Thought with ID {id} not found"),
            Self::Database(_) => "Internal server error".to_string(),
            Self::Connection(_) => "Database connection failed".to_string(),
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.status_code(),
            message: self.public_message(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "validation failed: {}", errors.join("; ")),
            Self::NotFound(id) => write!(f, "thought not found: {id}"),
            Self::Database(err) => write!(f, "database error: {err}"),
            Self::Connection(message) => write!(f, "connection error: {message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Connection(message) => Self::Connection(message),
            other => Self::Database(other),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::validation(value.message())
    }
}

/// Serialized error envelope: `{"code": 400, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}
