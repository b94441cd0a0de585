//! Plain `key=value` settings file codec and projector.

use crate::error::{EnvError, EnvResult};
use crate::model::dataset::Dataset;
use crate::model::project::Project;
use log::{error, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Renders entries as `key=value\n` lines in collection order.
pub fn render_settings<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a Dataset>,
{
    entries.into_iter().fold(String::new(), |mut out, entry| {
        out.push_str(entry.key());
        out.push('=');
        out.push_str(entry.value());
        out.push('\n');
        out
    })
}

/// Parses settings file content.
///
/// Empty lines are ignored. Each other line is split on its first `=`; a
/// line without one fails with `MalformedFileLine` (1-based line number).
pub fn parse_settings(path: &Path, content: &str) -> EnvResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for (index, line) in content.split('\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| EnvError::MalformedFileLine {
                path: path.to_path_buf(),
                line_number: index + 1,
            })?;
        pairs.push((key.to_string(), value.to_string()));
    }
    Ok(pairs)
}

/// Replaces the project's settings file with its current live entries.
///
/// Any existing file is removed first; a missing file is not an error.
/// Returns the path written.
pub fn write_project_file(project: &Project, file_name: &str) -> EnvResult<PathBuf> {
    let started_at = Instant::now();
    let path = project.settings_file_path(file_name);
    let content = render_settings(project.environments().iter());

    let result = remove_if_present(&path).and_then(|()| {
        fs::write(&path, content.as_bytes()).map_err(|source| EnvError::FileWrite {
            path: path.clone(),
            source,
        })
    });

    match result {
        Ok(()) => {
            info!(
                "event=env_file_write module=projection status=ok project_id={} entries={} duration_ms={}",
                project.id(),
                project.environments().len(),
                started_at.elapsed().as_millis()
            );
            Ok(path)
        }
        Err(err) => {
            error!(
                "event=env_file_write module=projection status=error project_id={} duration_ms={} error={}",
                project.id(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Replaces the project's entries with the content of its settings file.
///
/// Loaded entries are tagged `Unchanged`; they already match the file.
/// Returns the number of entries loaded.
pub fn load_project_file(project: &mut Project, file_name: &str) -> EnvResult<usize> {
    let path = project.settings_file_path(file_name);
    let content = fs::read_to_string(&path).map_err(|source| EnvError::FileRead {
        path: path.clone(),
        source,
    })?;

    let pairs = parse_settings(&path, &content)?;
    let count = pairs.len();
    project.replace_environments(pairs)?;

    info!(
        "event=env_file_load module=projection status=ok project_id={} entries={}",
        project.id(),
        count
    );
    Ok(count)
}

fn remove_if_present(path: &Path) -> EnvResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EnvError::FileWrite {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_settings, render_settings};
    use crate::error::EnvError;
    use crate::model::project::Project;
    use std::path::Path;

    #[test]
    fn render_skips_tombstoned_entries() {
        let mut project = Project::new("svc", "/app");
        project
            .replace_environments(vec![
                ("PORT".to_string(), "8080".to_string()),
                ("HOST".to_string(), "a".to_string()),
            ])
            .unwrap();
        project.remove_environment("HOST").unwrap();

        assert_eq!(render_settings(project.environments().iter()), "PORT=8080\n");
    }

    #[test]
    fn parse_splits_on_first_equals_only() {
        let pairs = parse_settings(Path::new(".env"), "URL=a=b\n\nEMPTY=\n").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("URL".to_string(), "a=b".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn parse_rejects_line_without_equals() {
        let err = parse_settings(Path::new(".env"), "A=1\nbroken\n").unwrap_err();
        assert!(matches!(err, EnvError::MalformedFileLine { line_number: 2, .. }));
    }
}
