//! Persistence synchronizer: flushes dirty in-memory entities to the store.
//!
//! # Responsibility
//! - Run the projects and templates phases concurrently, each in its own
//!   transaction on its own worker connection.
//! - Run the template values phase after both, since value rows reference
//!   template rows.
//! - Report partial success through a typed `FlushError`.
//!
//! # Invariants
//! - A phase that commits clears its entities' tags and purges its
//!   tombstones; a phase that fails leaves its entities untouched.
//! - In-memory collections are only read while phases run and only mutated
//!   after the join.

mod flush;

pub(crate) use flush::flush;
