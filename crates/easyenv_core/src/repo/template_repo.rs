//! Template and template value repository contracts and SQLite
//! implementation.
//!
//! # Invariants
//! - `templateValues` rows reference an existing `templates` row; deleting a
//!   template cascades to its values.
//! - `(templateID, keyName)` is unique.

use crate::model::dataset::Dataset;
use crate::model::lifecycle::Lifecycle;
use crate::model::template::{Template, TemplateId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection};

pub trait TemplateRepository {
    fn insert_template(&self, template: &Template) -> RepoResult<()>;
    fn update_template(&self, template: &Template) -> RepoResult<()>;
    fn delete_template(&self, id: TemplateId) -> RepoResult<()>;
    fn insert_value(&self, id: TemplateId, value: &Dataset) -> RepoResult<()>;
    fn update_value(&self, id: TemplateId, value: &Dataset) -> RepoResult<()>;
    /// Deleting an already-absent row is not an error; template deletion
    /// may have cascaded to it.
    fn delete_value(&self, id: TemplateId, key: &str) -> RepoResult<()>;
    /// Loads every template together with its values.
    fn list_templates(&self) -> RepoResult<Vec<Template>>;
}

pub struct SqliteTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTemplateRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_values(&self, id: TemplateId) -> RepoResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyName, value
             FROM templateValues
             WHERE templateID = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push((row.get("keyName")?, row.get("value")?));
        }
        Ok(values)
    }
}

impl TemplateRepository for SqliteTemplateRepository<'_> {
    fn insert_template(&self, template: &Template) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO templates (templateID, templateName) VALUES (?1, ?2);",
            params![template.id().to_string(), template.name()],
        )?;
        Ok(())
    }

    fn update_template(&self, template: &Template) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE templates SET templateName = ?1 WHERE templateID = ?2;",
            params![template.name(), template.id().to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "templates",
                id: template.id().to_string(),
            });
        }
        Ok(())
    }

    fn delete_template(&self, id: TemplateId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM templates WHERE templateID = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }

    fn insert_value(&self, id: TemplateId, value: &Dataset) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO templateValues (keyName, templateID, value) VALUES (?1, ?2, ?3);",
            params![value.key(), id.to_string(), value.value()],
        )?;
        Ok(())
    }

    fn update_value(&self, id: TemplateId, value: &Dataset) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE templateValues SET value = ?1 WHERE templateID = ?2 AND keyName = ?3;",
            params![value.value(), id.to_string(), value.key()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "templateValues",
                id: format!("{id}/{}", value.key()),
            });
        }
        Ok(())
    }

    fn delete_value(&self, id: TemplateId, key: &str) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM templateValues WHERE templateID = ?1 AND keyName = ?2;",
            params![id.to_string(), key],
        )?;
        Ok(())
    }

    fn list_templates(&self) -> RepoResult<Vec<Template>> {
        let mut stmt = self.conn.prepare(
            "SELECT templateID, templateName
             FROM templates
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut templates = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get("templateID")?;
            let id = parse_uuid(&id_text, "templates.templateID")?;
            let name: String = row.get("templateName")?;
            templates.push(Template::with_id(id, name, Lifecycle::Unchanged));
        }

        for template in &mut templates {
            let values = self.load_values(template.id())?;
            template
                .replace_environments(values)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        }

        Ok(templates)
    }
}
