use easyenv_core::projection::{load_project_file, write_project_file};
use easyenv_core::{EnvError, Lifecycle, Project, Registry};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::fs;

#[test]
fn flushed_project_is_projected_to_its_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let app_dir = dir.path().join("app");
    fs::create_dir(&app_dir).unwrap();
    let db = dir.path().join("store.db");

    let mut registry = Registry::new();
    let session = registry.open("main", &db).unwrap();
    let project_id = session.add_project("svc", &app_dir);
    session
        .find_project_mut(project_id)
        .unwrap()
        .add_environment("PORT", "8080")
        .unwrap();
    session.flush().unwrap();

    let rows: i64 = Connection::open(&db)
        .unwrap()
        .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        session.find_project(project_id).unwrap().lifecycle(),
        Lifecycle::Unchanged
    );

    let written = session.write_project_file(project_id).unwrap();
    assert_eq!(written, app_dir.join(".env"));
    assert_eq!(fs::read_to_string(&written).unwrap(), "PORT=8080\n");
}

#[test]
fn write_replaces_previous_file_content() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "STALE=1\nOLD=2\n").unwrap();

    let mut project = Project::new("svc", dir.path());
    project.add_environment("A", "1").unwrap();
    project.add_environment("B", "two words").unwrap();
    write_project_file(&project, ".env").unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join(".env")).unwrap(),
        "A=1\nB=two words\n"
    );
}

#[test]
fn write_then_load_reproduces_the_same_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = Project::new("svc", dir.path());
    project.add_environment("PORT", "8080").unwrap();
    project.add_environment("URL", "postgres://u:p@h/db?x=y").unwrap();
    project.add_environment("EMPTY", "").unwrap();
    write_project_file(&project, ".env").unwrap();

    let expected: BTreeSet<(String, String)> = project
        .environments()
        .iter()
        .map(|entry| (entry.key().to_string(), entry.value().to_string()))
        .collect();

    let loaded = load_project_file(&mut project, ".env").unwrap();
    assert_eq!(loaded, 3);
    let actual: BTreeSet<(String, String)> = project
        .environments()
        .iter()
        .map(|entry| (entry.key().to_string(), entry.value().to_string()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn empty_project_writes_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = Project::new("svc", dir.path());
    write_project_file(&project, ".env").unwrap();

    assert_eq!(fs::read_to_string(dir.path().join(".env")).unwrap(), "");
    assert_eq!(load_project_file(&mut project, ".env").unwrap(), 0);
}

#[test]
fn write_into_missing_directory_is_file_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let project = Project::new("svc", dir.path().join("missing"));

    let err = write_project_file(&project, ".env").unwrap_err();
    assert!(matches!(err, EnvError::FileWrite { .. }));
}

#[test]
fn load_of_missing_file_is_file_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = Project::new("svc", dir.path());

    let err = load_project_file(&mut project, ".env").unwrap_err();
    assert!(matches!(err, EnvError::FileRead { .. }));
}

#[test]
fn malformed_line_fails_whole_load_and_keeps_entries() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "A=1\nnot a pair\nB=2\n").unwrap();
    let mut project = Project::new("svc", dir.path());
    project.add_environment("KEEP", "me").unwrap();

    let err = load_project_file(&mut project, ".env").unwrap_err();
    assert!(matches!(
        err,
        EnvError::MalformedFileLine { line_number: 2, .. }
    ));
    assert_eq!(project.environments().len(), 1);
    assert_eq!(project.environment("KEEP").unwrap().value(), "me");
}

#[test]
fn duplicate_keys_in_file_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "A=1\nA=2\n").unwrap();
    let mut project = Project::new("svc", dir.path());

    let err = load_project_file(&mut project, ".env").unwrap_err();
    assert!(matches!(err, EnvError::DuplicateKey { ref key, .. } if key == "A"));
    assert!(project.environments().is_empty());
}

#[test]
fn write_all_reports_failure_after_trying_every_project() {
    let dir = tempfile::tempdir().unwrap();
    let good_dir = dir.path().join("good");
    fs::create_dir(&good_dir).unwrap();

    let mut registry = Registry::new();
    let session = registry.open("main", dir.path().join("store.db")).unwrap();
    session.add_project("broken", dir.path().join("missing"));
    let good = session.add_project("good", &good_dir);
    session
        .find_project_mut(good)
        .unwrap()
        .add_environment("OK", "1")
        .unwrap();

    let err = session.write_all_project_files().unwrap_err();
    assert!(matches!(err, EnvError::FileWrite { .. }));
    assert_eq!(fs::read_to_string(good_dir.join(".env")).unwrap(), "OK=1\n");
}
