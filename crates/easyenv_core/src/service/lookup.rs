//! Linear lookups over session collections.
//!
//! Entity counts per store are small (tens to low hundreds), so a scan is
//! used instead of an index. First match wins; tombstoned owners are skipped.

use crate::error::{EntityKind, EnvError, EnvResult};
use crate::model::dataset::Dataset;
use crate::model::project::{Project, ProjectId};
use crate::model::template::{Template, TemplateId};

pub fn find_project_by_id(projects: &[Project], id: ProjectId) -> EnvResult<&Project> {
    projects
        .iter()
        .find(|project| !project.is_deleted() && project.id() == id)
        .ok_or_else(|| EnvError::not_found(EntityKind::Project, id))
}

pub fn find_project_by_id_mut(
    projects: &mut [Project],
    id: ProjectId,
) -> EnvResult<&mut Project> {
    projects
        .iter_mut()
        .find(|project| !project.is_deleted() && project.id() == id)
        .ok_or_else(|| EnvError::not_found(EntityKind::Project, id))
}

pub fn find_template_by_id(templates: &[Template], id: TemplateId) -> EnvResult<&Template> {
    templates
        .iter()
        .find(|template| !template.is_deleted() && template.id() == id)
        .ok_or_else(|| EnvError::not_found(EntityKind::Template, id))
}

pub fn find_template_by_id_mut(
    templates: &mut [Template],
    id: TemplateId,
) -> EnvResult<&mut Template> {
    templates
        .iter_mut()
        .find(|template| !template.is_deleted() && template.id() == id)
        .ok_or_else(|| EnvError::not_found(EntityKind::Template, id))
}

/// Finds a live project by its display name.
pub fn find_project_by_name<'a>(projects: &'a [Project], name: &str) -> EnvResult<&'a Project> {
    projects
        .iter()
        .find(|project| !project.is_deleted() && project.name() == name)
        .ok_or_else(|| EnvError::not_found(EntityKind::Project, name))
}

pub fn find_template_by_name<'a>(
    templates: &'a [Template],
    name: &str,
) -> EnvResult<&'a Template> {
    templates
        .iter()
        .find(|template| !template.is_deleted() && template.name() == name)
        .ok_or_else(|| EnvError::not_found(EntityKind::Template, name))
}

pub fn find_dataset_by_key<'a, I>(entries: I, key: &str) -> EnvResult<&'a Dataset>
where
    I: IntoIterator<Item = &'a Dataset>,
{
    entries
        .into_iter()
        .find(|entry| entry.is_live() && entry.key() == key)
        .ok_or_else(|| EnvError::not_found(EntityKind::Key, key))
}
