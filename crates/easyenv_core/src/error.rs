//! Error taxonomy shared by the entity model, registry, flush and file
//! projection layers.
//!
//! # Invariants
//! - Entity-model errors (`DuplicateKey`, `NotFound`) are returned before any
//!   state is touched.
//! - `FlushError` always holds at least one failure and names every phase
//!   that did not commit.

use crate::db::DbError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

pub type EnvResult<T> = Result<T, EnvError>;

/// Entity kind searched by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Template,
    Key,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Template => "template",
            Self::Key => "key",
        }
    }
}

/// Owner of a Dataset collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Project(Uuid),
    Template(Uuid),
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::Template(id) => write!(f, "template {id}"),
        }
    }
}

/// Logical unit of work inside a flush, each with its own transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlushPhase {
    Projects,
    Templates,
    TemplateValues,
}

impl FlushPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Templates => "templates",
            Self::TemplateValues => "template_values",
        }
    }
}

impl Display for FlushPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store failure inside one phase; that phase's transaction was rolled back.
#[derive(Debug)]
pub struct TransactionFailure {
    pub phase: FlushPhase,
    pub source: RepoError,
}

impl Display for TransactionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} phase rolled back: {}", self.phase, self.source)
    }
}

impl Error for TransactionFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Why one phase did not commit.
#[derive(Debug)]
pub enum PhaseFailure {
    Transaction(TransactionFailure),
    /// The phase never ran because a phase it depends on failed.
    Skipped {
        phase: FlushPhase,
        blocked_by: FlushPhase,
    },
}

impl PhaseFailure {
    pub fn phase(&self) -> FlushPhase {
        match self {
            Self::Transaction(failure) => failure.phase,
            Self::Skipped { phase, .. } => *phase,
        }
    }
}

impl Display for PhaseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transaction(failure) => write!(f, "{failure}"),
            Self::Skipped { phase, blocked_by } => {
                write!(f, "{phase} phase skipped: {blocked_by} phase failed")
            }
        }
    }
}

/// Composite flush failure. Phases not listed here committed.
#[derive(Debug)]
pub struct FlushError {
    failures: Vec<PhaseFailure>,
}

impl FlushError {
    pub(crate) fn new(failures: Vec<PhaseFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[PhaseFailure] {
        &self.failures
    }

    pub fn failed_phases(&self) -> Vec<FlushPhase> {
        self.failures.iter().map(PhaseFailure::phase).collect()
    }

    pub fn is_phase_failed(&self, phase: FlushPhase) -> bool {
        self.failures.iter().any(|failure| failure.phase() == phase)
    }
}

impl Display for FlushError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "flush failed in {} phase(s): ", self.failures.len())?;
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl Error for FlushError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures.iter().find_map(|failure| match failure {
            PhaseFailure::Transaction(inner) => Some(inner as &(dyn Error + 'static)),
            PhaseFailure::Skipped { .. } => None,
        })
    }
}

#[derive(Debug)]
pub enum EnvError {
    NoOpenConnection,
    ConnectionNotFound(String),
    DuplicateConnection(String),
    NotFound { kind: EntityKind, key: String },
    DuplicateKey { owner: Owner, key: String },
    FileWrite { path: PathBuf, source: io::Error },
    FileRead { path: PathBuf, source: io::Error },
    MalformedFileLine { path: PathBuf, line_number: usize },
    Db(DbError),
    Flush(FlushError),
    InvalidData(String),
}

impl EnvError {
    pub(crate) fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

impl Display for EnvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOpenConnection => write!(f, "no open connection selected"),
            Self::ConnectionNotFound(name) => {
                write!(f, "no connection found for the store named `{name}`")
            }
            Self::DuplicateConnection(name) => {
                write!(f, "a connection named `{name}` is already registered")
            }
            Self::NotFound { kind, key } => write!(f, "{} not found: {key}", kind.as_str()),
            Self::DuplicateKey { owner, key } => {
                write!(f, "{owner} already has an environment with the key `{key}`")
            }
            Self::FileWrite { path, source } => {
                write!(f, "failed to write settings file `{}`: {source}", path.display())
            }
            Self::FileRead { path, source } => {
                write!(f, "failed to read settings file `{}`: {source}", path.display())
            }
            Self::MalformedFileLine { path, line_number } => write!(
                f,
                "malformed line {line_number} in settings file `{}`: expected key=value",
                path.display()
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::Flush(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for EnvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FileWrite { source, .. } | Self::FileRead { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Flush(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for EnvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for EnvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<FlushError> for EnvError {
    fn from(value: FlushError) -> Self {
        Self::Flush(value)
    }
}
