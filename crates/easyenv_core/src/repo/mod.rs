//! Repository layer: parameterized SQL for each stored entity kind.
//!
//! # Responsibility
//! - Keep SQL text inside the core persistence boundary.
//! - Work on any `Connection`, including an open `Transaction` (which derefs
//!   to one), so flush phases decide transaction scope.
//!
//! # Invariants
//! - Table/column names are fixed; only values are bound as parameters.
//! - Update paths report `NotFound` when no row matched.

pub mod project_repo;
pub mod template_repo;

use crate::db::DbError;
use crate::error::EnvError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { table: &'static str, id: String },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "no row in {table} for id {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for EnvError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::NotFound { table, id } => {
                Self::InvalidData(format!("row vanished from {table}: {id}"))
            }
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

pub(crate) fn parse_uuid(text: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}
