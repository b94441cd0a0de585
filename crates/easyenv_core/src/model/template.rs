//! Template domain model.
//!
//! Templates are reusable settings sets with no filesystem location. Their
//! entries are stored in `templateValues`.

use crate::error::{EnvResult, Owner};
use crate::model::dataset::{Dataset, Datasets};
use crate::model::lifecycle::Lifecycle;
use uuid::Uuid;

pub type TemplateId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: TemplateId,
    name: String,
    values: Datasets,
    lifecycle: Lifecycle,
}

impl Template {
    /// Creates a new template with a generated ID, tagged `Insert`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, Lifecycle::Insert)
    }

    pub fn with_id(id: TemplateId, name: impl Into<String>, lifecycle: Lifecycle) -> Self {
        Self {
            id,
            name: name.into(),
            values: Datasets::new(Owner::Template(id)),
            lifecycle,
        }
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
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

    pub(crate) fn mark_deleted(&mut self) {
        self.lifecycle = Lifecycle::Delete;
        self.values.remove_all();
    }

    /// Clears the template row tag; entries are committed by their own phase.
    pub(crate) fn commit_row(&mut self) {
        self.lifecycle = Lifecycle::Unchanged;
    }

    pub(crate) fn commit_values(&mut self) {
        self.values.commit();
    }
}
