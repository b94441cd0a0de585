//! Sessions over named stores and the registry tracking them.
//!
//! # Responsibility
//! - Bind one opened store to its in-memory projects and templates.
//! - Expose the entity operations, flush and file projection for that store.
//!
//! # Invariants
//! - A session exclusively owns its projects and templates.
//! - Sessions are only reachable through the `Registry`, which refuses every
//!   access when no session is selected.

mod registry;

pub use registry::Registry;

use crate::config::EnvConfig;
use crate::db::Store;
use crate::error::{EntityKind, EnvError, EnvResult};
use crate::model::lifecycle::Lifecycle;
use crate::model::project::{Project, ProjectId};
use crate::model::template::{Template, TemplateId};
use crate::projection::{load_project_file, write_project_file};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::template_repo::{SqliteTemplateRepository, TemplateRepository};
use crate::service::{lookup, template_apply};
use crate::sync;
use log::info;
use std::path::{Path, PathBuf};

/// One opened store with its working copy of projects and templates.
#[derive(Debug)]
pub struct Session {
    name: String,
    store: Store,
    config: EnvConfig,
    projects: Vec<Project>,
    templates: Vec<Template>,
}

impl Session {
    /// Opens (or creates) the store at `path` and loads every stored project
    /// and template, tagged `Unchanged`.
    ///
    /// Project entries are not loaded here; they live in each project's
    /// settings file (see `load_project_file`).
    pub fn open(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        config: EnvConfig,
    ) -> EnvResult<Self> {
        let store = Store::open(path, config.busy_timeout())?;
        let mut session = Self {
            name: name.into(),
            store,
            config,
            projects: Vec::new(),
            templates: Vec::new(),
        };
        session.reload()?;
        Ok(session)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Discards the working copy and re-reads all rows from the store.
    pub fn reload(&mut self) -> EnvResult<()> {
        let conn = self.store.connection();
        let projects = SqliteProjectRepository::new(conn).list_projects()?;
        let templates = SqliteTemplateRepository::new(conn).list_templates()?;
        info!(
            "event=session_load module=session status=ok projects={} templates={}",
            projects.len(),
            templates.len()
        );
        self.projects = projects;
        self.templates = templates;
        Ok(())
    }

    /// Re-reads one template and its values, dropping unflushed changes to it.
    pub fn reload_template(&mut self, id: TemplateId) -> EnvResult<()> {
        let stored = SqliteTemplateRepository::new(self.store.connection())
            .list_templates()?
            .into_iter()
            .find(|template| template.id() == id)
            .ok_or_else(|| EnvError::not_found(EntityKind::Template, id))?;

        match self.templates.iter().position(|template| template.id() == id) {
            Some(index) => self.templates[index] = stored,
            None => self.templates.push(stored),
        }
        Ok(())
    }

    /// Live projects in creation order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|project| !project.is_deleted())
    }

    /// Live templates in creation order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(|template| !template.is_deleted())
    }

    pub fn has_pending_changes(&self) -> bool {
        self.projects
            .iter()
            .any(|project| project.lifecycle().is_pending())
            || self.templates.iter().any(|template| {
                template.lifecycle().is_pending() || template.environments().has_pending_changes()
            })
    }

    pub fn add_project(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> ProjectId {
        let project = Project::new(name, path);
        let id = project.id();
        self.projects.push(project);
        id
    }

    pub fn add_template(&mut self, name: impl Into<String>) -> TemplateId {
        let template = Template::new(name);
        let id = template.id();
        self.templates.push(template);
        id
    }

    pub fn find_project(&self, id: ProjectId) -> EnvResult<&Project> {
        lookup::find_project_by_id(&self.projects, id)
    }

    pub fn find_project_mut(&mut self, id: ProjectId) -> EnvResult<&mut Project> {
        lookup::find_project_by_id_mut(&mut self.projects, id)
    }

    pub fn find_project_by_name(&self, name: &str) -> EnvResult<&Project> {
        lookup::find_project_by_name(&self.projects, name)
    }

    pub fn find_template(&self, id: TemplateId) -> EnvResult<&Template> {
        lookup::find_template_by_id(&self.templates, id)
    }

    pub fn find_template_mut(&mut self, id: TemplateId) -> EnvResult<&mut Template> {
        lookup::find_template_by_id_mut(&mut self.templates, id)
    }

    pub fn find_template_by_name(&self, name: &str) -> EnvResult<&Template> {
        lookup::find_template_by_name(&self.templates, name)
    }

    /// Removes a project and, implicitly, all of its entries.
    ///
    /// A project never flushed is dropped at once; a stored one is
    /// tombstoned until the next flush deletes its row.
    pub fn remove_project(&mut self, id: ProjectId) -> EnvResult<()> {
        let index = self
            .projects
            .iter()
            .position(|project| !project.is_deleted() && project.id() == id)
            .ok_or_else(|| EnvError::not_found(EntityKind::Project, id))?;
        if self.projects[index].lifecycle() == Lifecycle::Insert {
            self.projects.remove(index);
        } else {
            self.projects[index].mark_deleted();
        }
        Ok(())
    }

    /// Removes a template with the same rules as `remove_project`.
    pub fn remove_template(&mut self, id: TemplateId) -> EnvResult<()> {
        let index = self
            .templates
            .iter()
            .position(|template| !template.is_deleted() && template.id() == id)
            .ok_or_else(|| EnvError::not_found(EntityKind::Template, id))?;
        if self.templates[index].lifecycle() == Lifecycle::Insert {
            self.templates.remove(index);
        } else {
            self.templates[index].mark_deleted();
        }
        Ok(())
    }

    /// Copies a template's entries into a project. Nothing is flushed.
    pub fn apply_template(
        &mut self,
        template_id: TemplateId,
        project_id: ProjectId,
    ) -> EnvResult<usize> {
        let template = lookup::find_template_by_id(&self.templates, template_id)?;
        let project = lookup::find_project_by_id_mut(&mut self.projects, project_id)?;
        template_apply::apply_template(template, project)
    }

    /// Flushes every pending change to the store.
    ///
    /// On `EnvError::Flush`, phases not named in the error committed and
    /// their entities are already clean; calling `flush` again retries only
    /// what is still pending.
    pub fn flush(&mut self) -> EnvResult<()> {
        sync::flush(&mut self.store, &mut self.projects, &mut self.templates)?;
        Ok(())
    }

    /// Writes one project's settings file. Independent of `flush`.
    pub fn write_project_file(&self, id: ProjectId) -> EnvResult<PathBuf> {
        let project = self.find_project(id)?;
        write_project_file(project, &self.config.settings_file_name)
    }

    /// Writes the settings file of every live project.
    ///
    /// Every project is attempted; the first failure is returned after the
    /// others were tried.
    pub fn write_all_project_files(&self) -> EnvResult<usize> {
        let mut written = 0;
        let mut first_error = None;
        for project in self.projects() {
            match write_project_file(project, &self.config.settings_file_name) {
                Ok(_) => written += 1,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    /// Replaces one project's entries with its settings file content.
    pub fn load_project_file(&mut self, id: ProjectId) -> EnvResult<usize> {
        let project = lookup::find_project_by_id_mut(&mut self.projects, id)?;
        load_project_file(project, &self.config.settings_file_name)
    }

    pub(crate) fn close(self) -> EnvResult<()> {
        self.store.close()?;
        Ok(())
    }
}
