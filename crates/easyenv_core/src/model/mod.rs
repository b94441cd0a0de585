//! In-memory entity model for projects, templates and their settings.
//!
//! # Responsibility
//! - Hold the working copy of every project/template of one session.
//! - Track pending changes per record through a shared `Lifecycle` tag.
//!
//! # Invariants
//! - Every project and template is identified by a stable UUID.
//! - No two live Datasets of one owner share a key.
//! - Records that were never persisted are excised on removal; persisted
//!   records are tombstoned until the next successful flush.

pub mod dataset;
pub mod lifecycle;
pub mod project;
pub mod template;
