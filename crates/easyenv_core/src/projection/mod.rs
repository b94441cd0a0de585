//! File projection of project settings.
//!
//! # Responsibility
//! - Mirror a project's live settings to `<project path>/<settings file>`.
//! - Load a settings file back into a project's entries.
//!
//! # Invariants
//! - The file is a mirror, not a transactional peer of the store: a failed
//!   write never rolls back a committed flush, so the store and the file can
//!   diverge until the caller retries the write.
//! - Loads are strict; one malformed line fails the whole load and leaves
//!   the project untouched.

mod env_file;

pub use env_file::{load_project_file, parse_settings, render_settings, write_project_file};
