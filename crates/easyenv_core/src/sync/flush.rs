//! Fork/join flush of projects, templates and template values.

use crate::db::{Store, StoreOpener};
use crate::error::{FlushError, FlushPhase, PhaseFailure, TransactionFailure};
use crate::model::lifecycle::Lifecycle;
use crate::model::project::Project;
use crate::model::template::Template;
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::template_repo::{SqliteTemplateRepository, TemplateRepository};
use crate::repo::{RepoError, RepoResult};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
struct PhaseStats {
    inserted: usize,
    updated: usize,
    deleted: usize,
}

impl PhaseStats {
    fn record(&mut self, lifecycle: Lifecycle) {
        match lifecycle {
            Lifecycle::Unchanged => {}
            Lifecycle::Insert => self.inserted += 1,
            Lifecycle::Update => self.updated += 1,
            Lifecycle::Delete => self.deleted += 1,
        }
    }
}

/// Flushes every pending change of one session to its store.
///
/// Returns `FlushError` listing each phase that did not commit. Phases not
/// listed did commit, and their entities are already in sync.
pub(crate) fn flush(
    store: &mut Store,
    projects: &mut Vec<Project>,
    templates: &mut Vec<Template>,
) -> Result<(), FlushError> {
    let started_at = Instant::now();
    info!(
        "event=flush module=sync status=start projects={} templates={}",
        projects.len(),
        templates.len()
    );

    let opener = store.opener();
    let (project_result, template_result) = {
        let project_rows: &[Project] = projects;
        let template_rows: &[Template] = templates;
        let opener = &opener;
        thread::scope(|scope| {
            let project_phase = scope.spawn(move || {
                run_worker_phase(opener, FlushPhase::Projects, |tx| {
                    persist_projects(tx, project_rows)
                })
            });
            let template_phase = scope.spawn(move || {
                run_worker_phase(opener, FlushPhase::Templates, |tx| {
                    persist_templates(tx, template_rows)
                })
            });
            (join_phase(project_phase), join_phase(template_phase))
        })
    };

    let mut failures = Vec::new();

    match project_result {
        Ok(_) => {
            projects.retain(|project| !project.is_deleted());
            projects.iter_mut().for_each(Project::commit);
        }
        Err(failure) => failures.push(PhaseFailure::Transaction(failure)),
    }

    let templates_committed = match template_result {
        Ok(_) => {
            // Values of deleted templates were removed by the cascade.
            templates.retain(|template| !template.is_deleted());
            templates.iter_mut().for_each(Template::commit_row);
            true
        }
        Err(failure) => {
            failures.push(PhaseFailure::Transaction(failure));
            false
        }
    };

    if templates_committed {
        let template_rows: &[Template] = templates;
        let values_result = run_phase(
            store.connection_mut(),
            FlushPhase::TemplateValues,
            |tx| persist_template_values(tx, template_rows),
        );
        match values_result {
            Ok(_) => templates.iter_mut().for_each(Template::commit_values),
            Err(failure) => failures.push(PhaseFailure::Transaction(failure)),
        }
    } else {
        warn!(
            "event=flush_phase module=sync status=skipped phase={} blocked_by={}",
            FlushPhase::TemplateValues,
            FlushPhase::Templates
        );
        failures.push(PhaseFailure::Skipped {
            phase: FlushPhase::TemplateValues,
            blocked_by: FlushPhase::Templates,
        });
    }

    if failures.is_empty() {
        info!(
            "event=flush module=sync status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        return Ok(());
    }

    error!(
        "event=flush module=sync status=error duration_ms={} failed_phases={}",
        started_at.elapsed().as_millis(),
        failures
            .iter()
            .map(|failure| failure.phase().as_str())
            .collect::<Vec<_>>()
            .join(",")
    );
    Err(FlushError::new(failures))
}

fn join_phase<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

fn run_worker_phase<F>(
    opener: &StoreOpener,
    phase: FlushPhase,
    persist: F,
) -> Result<PhaseStats, TransactionFailure>
where
    F: FnOnce(&Transaction<'_>) -> RepoResult<PhaseStats>,
{
    let mut conn = opener.open().map_err(|err| {
        error!(
            "event=flush_phase module=sync status=error phase={} error_code=worker_open_failed error={}",
            phase, err
        );
        TransactionFailure {
            phase,
            source: RepoError::Db(err),
        }
    })?;
    run_phase(&mut conn, phase, persist)
}

/// Runs one phase inside its own immediate transaction.
///
/// Any statement failure rolls back this phase only.
fn run_phase<F>(
    conn: &mut Connection,
    phase: FlushPhase,
    persist: F,
) -> Result<PhaseStats, TransactionFailure>
where
    F: FnOnce(&Transaction<'_>) -> RepoResult<PhaseStats>,
{
    let started_at = Instant::now();
    let fail = |source: RepoError| {
        error!(
            "event=flush_phase module=sync status=error phase={} duration_ms={} error={}",
            phase,
            started_at.elapsed().as_millis(),
            source
        );
        TransactionFailure { phase, source }
    };

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| fail(err.into()))?;

    let stats = match persist(&tx) {
        Ok(stats) => stats,
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=flush_phase module=sync status=rollback_failed phase={} error={}",
                    phase, rollback_err
                );
            }
            return Err(fail(err));
        }
    };

    tx.commit().map_err(|err| fail(err.into()))?;
    info!(
        "event=flush_phase module=sync status=ok phase={} duration_ms={} inserted={} updated={} deleted={}",
        phase,
        started_at.elapsed().as_millis(),
        stats.inserted,
        stats.updated,
        stats.deleted
    );
    Ok(stats)
}

fn persist_projects(tx: &Transaction<'_>, projects: &[Project]) -> RepoResult<PhaseStats> {
    let repo = SqliteProjectRepository::new(tx);
    let mut stats = PhaseStats::default();
    for project in projects {
        match project.lifecycle() {
            Lifecycle::Unchanged => continue,
            Lifecycle::Insert => repo.insert_project(project)?,
            Lifecycle::Update => repo.update_project(project)?,
            Lifecycle::Delete => repo.delete_project(project.id())?,
        }
        stats.record(project.lifecycle());
    }
    Ok(stats)
}

fn persist_templates(tx: &Transaction<'_>, templates: &[Template]) -> RepoResult<PhaseStats> {
    let repo = SqliteTemplateRepository::new(tx);
    let mut stats = PhaseStats::default();
    for template in templates {
        match template.lifecycle() {
            Lifecycle::Unchanged => continue,
            Lifecycle::Insert => repo.insert_template(template)?,
            Lifecycle::Update => repo.update_template(template)?,
            Lifecycle::Delete => repo.delete_template(template.id())?,
        }
        stats.record(template.lifecycle());
    }
    Ok(stats)
}

fn persist_template_values(
    tx: &Transaction<'_>,
    templates: &[Template],
) -> RepoResult<PhaseStats> {
    let repo = SqliteTemplateRepository::new(tx);
    let mut stats = PhaseStats::default();
    for template in templates {
        for value in template.environments().all() {
            match value.lifecycle() {
                Lifecycle::Unchanged => continue,
                Lifecycle::Insert => repo.insert_value(template.id(), value)?,
                Lifecycle::Update => repo.update_value(template.id(), value)?,
                Lifecycle::Delete => repo.delete_value(template.id(), value.key())?,
            }
            stats.record(value.lifecycle());
        }
    }
    Ok(stats)
}
