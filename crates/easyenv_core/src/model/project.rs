//! Project domain model.
//!
//! # Responsibility
//! - Represent one named project tied to a filesystem directory.
//! - Own the project's settings entries.
//!
//! # Invariants
//! - `id` is stable and never reused for another project.
//! - A project tagged `Delete` has all of its entries tagged `Delete` too.
//! - Project entries are mirrored to the settings file only; the relational
//!   store holds the project row itself.

use crate::error::{EnvResult, Owner};
use crate::model::dataset::{Dataset, Datasets};
use crate::model::lifecycle::Lifecycle;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub type ProjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    name: String,
    /// Directory containing the project's settings file.
    path: PathBuf,
    values: Datasets,
    lifecycle: Lifecycle,
}

impl Project {
    /// Creates a new project with a generated ID, tagged `Insert`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::with_id(Uuid::new_v4(), name, path, Lifecycle::Insert)
    }

    /// Creates a project with a caller-provided ID.
    ///
    /// Used by load paths where identity already exists in the store.
    pub fn with_id(
        id: ProjectId,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            values: Datasets::new(Owner::Project(id)),
            lifecycle,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// Location of the settings file for this project.
    pub fn settings_file_path(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.lifecycle.touch();
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.lifecycle.touch();
    }

    pub fn environments(&self) -> &Datasets {
        &self.values
    }

    pub fn environment(&self, key: &str) -> EnvResult<&Dataset> {
        self.values.find_by_key(key)
    }

    pub fn add_environment(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> EnvResult<()> {
        self.values.add(key, value)
    }

    pub fn set_env_value(&mut self, key: &str, value: impl Into<String>) -> EnvResult<()> {
        self.values.set_value(key, value)
    }

    pub fn remove_environment(&mut self, key: &str) -> EnvResult<()> {
        self.values.remove(key)
    }

    pub fn remove_all_environments(&mut self) {
        self.values.remove_all();
    }

    pub(crate) fn replace_environments<I>(&mut self, pairs: I) -> EnvResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.values.replace_unchanged(pairs)
    }

    /// Tombstones the project and every entry it owns.
    pub(crate) fn mark_deleted(&mut self) {
        self.lifecycle = Lifecycle::Delete;
        self.values.remove_all();
    }

    pub(crate) fn commit(&mut self) {
        self.lifecycle = Lifecycle::Unchanged;
        self.values.commit();
    }
}
