//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert/update/delete rows of `projects` by stable ID.
//! - Load stored project rows for a session.
//!
//! # Invariants
//! - Project settings entries never touch SQL; they live in the settings file.

use crate::model::lifecycle::Lifecycle;
use crate::model::project::{Project, ProjectId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection};
use std::path::PathBuf;

pub trait ProjectRepository {
    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    fn update_project(&self, project: &Project) -> RepoResult<()>;
    /// Deleting an already-absent row is not an error.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
}

pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (projectID, projectName, path) VALUES (?1, ?2, ?3);",
            params![
                project.id().to_string(),
                project.name(),
                path_to_db(project)?,
            ],
        )?;
        Ok(())
    }

    fn update_project(&self, project: &Project) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET projectName = ?1, path = ?2 WHERE projectID = ?3;",
            params![
                project.name(),
                path_to_db(project)?,
                project.id().to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "projects",
                id: project.id().to_string(),
            });
        }
        Ok(())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM projects WHERE projectID = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT projectID, projectName, path
             FROM projects
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get("projectID")?;
            let id = parse_uuid(&id_text, "projects.projectID")?;
            let name: String = row.get("projectName")?;
            let path: String = row.get("path")?;
            projects.push(Project::with_id(
                id,
                name,
                PathBuf::from(path),
                Lifecycle::Unchanged,
            ));
        }

        Ok(projects)
    }
}

fn path_to_db(project: &Project) -> RepoResult<&str> {
    project.path().to_str().ok_or_else(|| {
        RepoError::InvalidData(format!(
            "project {} path is not valid UTF-8",
            project.id()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::{ProjectRepository, SqliteProjectRepository};
    use crate::db::open_db_in_memory;
    use crate::model::lifecycle::Lifecycle;
    use crate::model::project::Project;
    use crate::repo::RepoError;

    #[test]
    fn insert_update_list_delete_roundtrip() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteProjectRepository::new(&conn);

        let mut project = Project::new("svc", "/app");
        repo.insert_project(&project).unwrap();
        project.set_path("/srv/app");
        repo.update_project(&project).unwrap();

        let loaded = repo.list_projects().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), project.id());
        assert_eq!(loaded[0].path().to_str(), Some("/srv/app"));
        assert_eq!(loaded[0].lifecycle(), Lifecycle::Unchanged);

        repo.delete_project(project.id()).unwrap();
        repo.delete_project(project.id()).unwrap();
        assert!(repo.list_projects().unwrap().is_empty());
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteProjectRepository::new(&conn);

        let err = repo.update_project(&Project::new("ghost", "/tmp")).unwrap_err();
        assert!(matches!(err, RepoError::NotFound { table: "projects", .. }));
    }
}
