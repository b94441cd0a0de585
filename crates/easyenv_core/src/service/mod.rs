//! Core use-case services over the entity model.
//!
//! # Responsibility
//! - Lookups across session collections.
//! - Template propagation into projects.

pub mod lookup;
pub mod template_apply;
