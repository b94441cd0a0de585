//! Core domain logic for easyenv.
//!
//! Named projects and reusable templates of `key=value` settings, kept in a
//! SQLite store and mirrored to each project's settings file.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;
pub mod session;
mod sync;

pub use config::{EnvConfig, DEFAULT_SETTINGS_FILE_NAME};
pub use error::{
    EntityKind, EnvError, EnvResult, FlushError, FlushPhase, Owner, PhaseFailure,
    TransactionFailure,
};
pub use logging::{default_log_level, init_logging, init_logging_with_config, logging_status};
pub use model::dataset::{Dataset, Datasets};
pub use model::lifecycle::Lifecycle;
pub use model::project::{Project, ProjectId};
pub use model::template::{Template, TemplateId};
pub use service::template_apply::apply_template;
pub use session::{Registry, Session};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
