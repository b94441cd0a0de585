//! Template propagation into projects.
//!
//! # Invariants
//! - Pure in-memory copy; nothing is flushed or written to disk.
//! - All-or-nothing: keys are checked in template order before any entry is
//!   added, and the first key the project already has fails the call.

use crate::error::{EnvError, EnvResult};
use crate::model::project::Project;
use crate::model::template::Template;
use log::{info, warn};

/// Copies every live entry of `template` into `project` as new entries.
///
/// Returns the number of entries added.
pub fn apply_template(template: &Template, project: &mut Project) -> EnvResult<usize> {
    if let Some(conflict) = template
        .environments()
        .iter()
        .find(|entry| project.environments().contains_key(entry.key()))
    {
        warn!(
            "event=template_apply module=service status=error template_id={} project_id={} error_code=duplicate_key",
            template.id(),
            project.id()
        );
        return Err(EnvError::DuplicateKey {
            owner: project.environments().owner(),
            key: conflict.key().to_string(),
        });
    }

    let mut added = 0;
    for entry in template.environments().iter() {
        project.add_environment(entry.key(), entry.value())?;
        added += 1;
    }

    info!(
        "event=template_apply module=service status=ok template_id={} project_id={} entries={}",
        template.id(),
        project.id(),
        added
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::apply_template;
    use crate::error::EnvError;
    use crate::model::lifecycle::Lifecycle;
    use crate::model::project::Project;
    use crate::model::template::Template;

    #[test]
    fn copies_entries_tagged_insert() {
        let mut template = Template::new("web");
        template.add_environment("PORT", "80").unwrap();
        template.add_environment("HOST", "0.0.0.0").unwrap();
        let mut project = Project::new("svc", "/app");

        assert_eq!(apply_template(&template, &mut project).unwrap(), 2);
        let port = project.environment("PORT").unwrap();
        assert_eq!(port.value(), "80");
        assert_eq!(port.lifecycle(), Lifecycle::Insert);
    }

    #[test]
    fn conflict_adds_nothing() {
        let mut template = Template::new("web");
        template.add_environment("A", "1").unwrap();
        template.add_environment("B", "2").unwrap();
        let mut project = Project::new("svc", "/app");
        project.add_environment("A", "mine").unwrap();

        let err = apply_template(&template, &mut project).unwrap_err();
        assert!(matches!(err, EnvError::DuplicateKey { ref key, .. } if key == "A"));
        assert!(!project.environments().contains_key("B"));
        assert_eq!(project.environment("A").unwrap().value(), "mine");
    }

    #[test]
    fn later_conflict_still_leaves_project_untouched() {
        let mut template = Template::new("web");
        template.add_environment("B", "2").unwrap();
        template.add_environment("A", "1").unwrap();
        let mut project = Project::new("svc", "/app");
        project.add_environment("A", "mine").unwrap();

        assert!(apply_template(&template, &mut project).is_err());
        assert_eq!(project.environments().len(), 1);
    }
}
