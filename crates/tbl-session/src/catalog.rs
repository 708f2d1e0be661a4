//! Exercise catalog backed by a directory of prompt files
//!
//! Each exercise is a UTF-8 `<name>.txt` file whose contents are used verbatim
//! as the system prompt.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;

/// Default directory holding the exercise prompts
pub const DEFAULT_PROMPTS_DIR: &str = "systemmessages";

/// A named exercise and its system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseDefinition {
    pub name: String,
    pub system_prompt: String,
}

/// Resolves exercise names to system prompts
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    dir: PathBuf,
}

impl ExerciseCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List exercise names, sorted. An unreadable or empty directory yields
    /// an empty list.
    pub fn list_exercises(&self) -> Vec<String> {
        if !self.dir.is_dir() {
            tracing::warn!(dir = %self.dir.display(), "Exercise directory not found");
            return Vec::new();
        }

        let pattern = format!(
            "{}/*.txt",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );
        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!(dir = %self.dir.display(), "Error reading exercise directory: {}", e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = paths
            .filter_map(|entry| match entry {
                Ok(path) if path.is_file() => path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Skipping unreadable exercise entry: {}", e);
                    None
                }
            })
            .collect();
        names.sort();

        if names.is_empty() {
            tracing::warn!(dir = %self.dir.display(), "No exercises available");
        }

        names
    }

    /// Load the system prompt for `name`
    pub fn load(&self, name: &str) -> Result<ExerciseDefinition, CatalogError> {
        if !is_plain_name(name) {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let path = self.dir.join(format!("{}.txt", name));
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "System message file not found");
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let system_prompt = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound(name.to_string())
            } else {
                CatalogError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })?;

        Ok(ExerciseDefinition {
            name: name.to_string(),
            system_prompt,
        })
    }
}

/// Names are file stems only; anything that could leave the directory is rejected.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn catalog_with(files: &[(&str, &str)]) -> (tempfile::TempDir, ExerciseCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let catalog = ExerciseCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn test_lists_txt_stems_sorted() {
        let (_dir, catalog) = catalog_with(&[
            ("week2_vaccines.txt", "b"),
            ("intro.txt", "a"),
            ("notes.md", "ignored"),
        ]);
        assert_eq!(catalog.list_exercises(), vec!["intro", "week2_vaccines"]);
    }

    #[test]
    fn test_empty_directory_lists_nothing() {
        let (_dir, catalog) = catalog_with(&[]);
        assert!(catalog.list_exercises().is_empty());
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ExerciseCatalog::new(dir.path().join("does-not-exist"));
        assert!(catalog.list_exercises().is_empty());
    }

    #[test]
    fn test_subdirectories_are_not_exercises() {
        let (dir, catalog) = catalog_with(&[("intro.txt", "a")]);
        fs::create_dir(dir.path().join("archive.txt")).unwrap();
        assert_eq!(catalog.list_exercises(), vec!["intro"]);
    }

    #[test]
    fn test_load_returns_verbatim_prompt() {
        let prompt = "You are a patient presenting with fatigue.\n\nStay in character.\n";
        let (_dir, catalog) = catalog_with(&[("intro.txt", prompt)]);
        let exercise = catalog.load("intro").unwrap();
        assert_eq!(exercise.name, "intro");
        assert_eq!(exercise.system_prompt, prompt);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, catalog) = catalog_with(&[("intro.txt", "a")]);
        let err = catalog.load("advanced").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(ref n) if n == "advanced"));
    }

    #[test]
    fn test_load_rejects_path_names() {
        let (_dir, catalog) = catalog_with(&[("intro.txt", "a")]);
        assert!(matches!(catalog.load("../intro"), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.load(""), Err(CatalogError::NotFound(_))));
    }
}
