use easyenv_core::{EnvError, FlushPhase, Lifecycle, PhaseFailure, Registry};
use rusqlite::Connection;
use std::path::Path;

fn count_rows(db: &Path, table: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn full_flush_persists_rows_and_clears_tags() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("svc", "/app");
    session
        .find_project_mut(project_id)
        .unwrap()
        .add_environment("PORT", "8080")
        .unwrap();
    let template_id = session.add_template("web");
    {
        let template = session.find_template_mut(template_id).unwrap();
        template.add_environment("HOST", "0.0.0.0").unwrap();
        template.add_environment("PORT", "80").unwrap();
    }
    assert!(session.has_pending_changes());

    session.flush().unwrap();

    assert_eq!(count_rows(&db, "projects"), 1);
    assert_eq!(count_rows(&db, "templates"), 1);
    assert_eq!(count_rows(&db, "templateValues"), 2);

    let project = session.find_project(project_id).unwrap();
    assert_eq!(project.lifecycle(), Lifecycle::Unchanged);
    assert_eq!(
        project.environment("PORT").unwrap().lifecycle(),
        Lifecycle::Unchanged
    );
    let template = session.find_template(template_id).unwrap();
    assert_eq!(template.lifecycle(), Lifecycle::Unchanged);
    assert!(template
        .environments()
        .iter()
        .all(|entry| entry.lifecycle() == Lifecycle::Unchanged));
    assert!(!session.has_pending_changes());
}

#[test]
fn failed_project_phase_does_not_block_templates() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("svc", "/app");
    let template_id = session.add_template("web");
    session
        .find_template_mut(template_id)
        .unwrap()
        .add_environment("PORT", "80")
        .unwrap();

    // A row with the same primary key makes the project insert fail.
    let external = Connection::open(&db).unwrap();
    external
        .execute(
            "INSERT INTO projects (projectID, projectName, path) VALUES (?1, 'other', '/other');",
            [project_id.to_string()],
        )
        .unwrap();
    drop(external);

    let err = session.flush().unwrap_err();
    let flush_error = match err {
        EnvError::Flush(flush_error) => flush_error,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(flush_error.failed_phases(), vec![FlushPhase::Projects]);
    assert!(matches!(
        flush_error.failures()[0],
        PhaseFailure::Transaction(_)
    ));
    assert!(flush_error.to_string().contains("projects"));
    assert!(!flush_error.to_string().contains("template"));

    assert_eq!(
        session.find_project(project_id).unwrap().lifecycle(),
        Lifecycle::Insert
    );
    let template = session.find_template(template_id).unwrap();
    assert_eq!(template.lifecycle(), Lifecycle::Unchanged);
    assert_eq!(
        template.environment("PORT").unwrap().lifecycle(),
        Lifecycle::Unchanged
    );
    assert_eq!(count_rows(&db, "templates"), 1);
    assert_eq!(count_rows(&db, "templateValues"), 1);
}

#[test]
fn retrying_after_partial_failure_flushes_only_what_is_pending() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("svc", "/app");
    session.add_template("web");

    let external = Connection::open(&db).unwrap();
    external
        .execute(
            "INSERT INTO projects (projectID, projectName, path) VALUES (?1, 'other', '/other');",
            [project_id.to_string()],
        )
        .unwrap();
    assert!(session.flush().is_err());

    external
        .execute("DELETE FROM projects WHERE projectID = ?1;", [project_id.to_string()])
        .unwrap();
    drop(external);

    session.flush().unwrap();
    assert_eq!(count_rows(&db, "projects"), 1);
    assert_eq!(count_rows(&db, "templates"), 1);
    assert!(!session.has_pending_changes());
}

#[test]
fn failed_template_phase_skips_template_values() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("svc", "/app");
    let template_id = session.add_template("web");
    session
        .find_template_mut(template_id)
        .unwrap()
        .add_environment("PORT", "80")
        .unwrap();

    let external = Connection::open(&db).unwrap();
    external
        .execute(
            "INSERT INTO templates (templateID, templateName) VALUES (?1, 'taken');",
            [template_id.to_string()],
        )
        .unwrap();
    drop(external);

    let err = session.flush().unwrap_err();
    let flush_error = match err {
        EnvError::Flush(flush_error) => flush_error,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(
        flush_error.failed_phases(),
        vec![FlushPhase::Templates, FlushPhase::TemplateValues]
    );
    assert!(matches!(
        flush_error.failures()[1],
        PhaseFailure::Skipped {
            phase: FlushPhase::TemplateValues,
            blocked_by: FlushPhase::Templates,
        }
    ));

    assert_eq!(
        session.find_project(project_id).unwrap().lifecycle(),
        Lifecycle::Unchanged
    );
    let template = session.find_template(template_id).unwrap();
    assert_eq!(template.lifecycle(), Lifecycle::Insert);
    assert_eq!(
        template.environment("PORT").unwrap().lifecycle(),
        Lifecycle::Insert
    );
    assert_eq!(count_rows(&db, "templateValues"), 0);
}

#[test]
fn updates_and_deletes_reach_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("svc", "/app");
    let template_id = session.add_template("web");
    {
        let template = session.find_template_mut(template_id).unwrap();
        template.add_environment("PORT", "80").unwrap();
        template.add_environment("HOST", "a").unwrap();
    }
    session.flush().unwrap();

    session
        .find_project_mut(project_id)
        .unwrap()
        .set_name("api");
    {
        let template = session.find_template_mut(template_id).unwrap();
        template.set_env_value("PORT", "8080").unwrap();
        template.remove_environment("HOST").unwrap();
        assert_eq!(
            template.environment("PORT").unwrap().lifecycle(),
            Lifecycle::Update
        );
    }
    session.flush().unwrap();

    let conn = Connection::open(&db).unwrap();
    let name: String = conn
        .query_row("SELECT projectName FROM projects;", [], |row| row.get(0))
        .unwrap();
    let port: String = conn
        .query_row(
            "SELECT value FROM templateValues WHERE keyName = 'PORT';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "api");
    assert_eq!(port, "8080");
    assert_eq!(count_rows(&db, "templateValues"), 1);
    assert_eq!(
        session
            .find_template(template_id)
            .unwrap()
            .environments()
            .all()
            .len(),
        1
    );
}

#[test]
fn removed_owners_are_tombstoned_until_flush() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("svc", "/app");
    let template_id = session.add_template("web");
    session
        .find_template_mut(template_id)
        .unwrap()
        .add_environment("PORT", "80")
        .unwrap();
    session.flush().unwrap();

    session.remove_project(project_id).unwrap();
    session.remove_template(template_id).unwrap();
    assert!(session.find_project(project_id).is_err());
    assert!(session.find_template(template_id).is_err());
    assert_eq!(count_rows(&db, "projects"), 1);

    session.flush().unwrap();

    assert_eq!(count_rows(&db, "projects"), 0);
    assert_eq!(count_rows(&db, "templates"), 0);
    assert_eq!(count_rows(&db, "templateValues"), 0);
    assert_eq!(session.projects().count(), 0);
    assert!(!session.has_pending_changes());
}

#[test]
fn removing_unflushed_project_never_touches_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();

    let project_id = session.add_project("draft", "/tmp/draft");
    session.remove_project(project_id).unwrap();
    assert!(!session.has_pending_changes());

    session.flush().unwrap();
    assert_eq!(count_rows(&db, "projects"), 0);
}
