//! Run Registry - read-only view over the runs directory
//!
//! Holds no state: every call rescans the filesystem.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::{is_staging_name, APPLIED_REQUESTS_FILE, INDEX_FILE, SEED_FILE};
use crate::error::{CoreError, CoreResult};
use crate::layout::{read_json, ProjectLayout};
use crate::schema::Section;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub created_at: DateTime<Local>,
    pub has_seed: bool,
    pub has_build: bool,
}

/// Whichever config files a run directory holds, as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunContents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_requests: Option<Value>,
}

pub struct RunRegistry {
    runs_dir: PathBuf,
}

impl RunRegistry {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            runs_dir: layout.runs_dir.clone(),
        }
    }

    /// All runs, most recent identifier first.
    pub fn list(&self) -> CoreResult<Vec<RunSummary>> {
        if !self.runs_dir.exists() {
            return Ok(vec![]);
        }

        let mut runs = vec![];
        for entry in fs::read_dir(&self.runs_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_staging_name(&name) || !entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            let modified = entry.metadata()?.modified()?;
            runs.push(RunSummary {
                created_at: DateTime::<Local>::from(modified),
                has_seed: path.join(SEED_FILE).exists(),
                has_build: path.join(INDEX_FILE).exists(),
                run_id: name,
            });
        }

        runs.sort_by(|a, b| b.run_id.cmp(&a.run_id));
        Ok(runs)
    }

    pub fn get(&self, run_id: &str) -> CoreResult<RunContents> {
        let dir = self.run_dir(run_id)?;
        let load = |file: &str| -> CoreResult<Option<Value>> {
            let path = dir.join(file);
            if path.exists() {
                Ok(Some(read_json(&path)?))
            } else {
                Ok(None)
            }
        };

        Ok(RunContents {
            mechanics: load(Section::Mechanics.file_name())?,
            levels: load(Section::Levels.file_name())?,
            visual: load(Section::Visual.file_name())?,
            seed: load(SEED_FILE)?,
            applied_requests: load(APPLIED_REQUESTS_FILE)?,
        })
    }

    /// Path of a run's playable `index.html`.
    pub fn play_file(&self, run_id: &str) -> CoreResult<PathBuf> {
        let index = self.run_dir(run_id)?.join(INDEX_FILE);
        if !index.exists() {
            return Err(CoreError::RunNotFound(run_id.to_string()));
        }
        Ok(index)
    }

    fn run_dir(&self, run_id: &str) -> CoreResult<PathBuf> {
        // Identifiers are single path components; anything else cannot name a run.
        let valid = !run_id.is_empty()
            && !is_staging_name(run_id)
            && !run_id.contains(['/', '\\'])
            && run_id != "..";
        let dir = self.runs_dir.join(run_id);
        if !valid || !dir.is_dir() {
            return Err(CoreError::RunNotFound(run_id.to_string()));
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, ProjectLayout, RunRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let registry = RunRegistry::new(&layout);
        (dir, layout, registry)
    }

    #[test]
    fn test_list_sorted_descending() {
        let (_dir, layout, registry) = registry();
        for id in [
            "build_20260101_000000_000_aaaaaa",
            "build_20260301_000000_000_bbbbbb",
            "build_20260201_000000_000_cccccc",
        ] {
            fs::create_dir_all(layout.run_dir(id)).unwrap();
        }
        let built = layout.run_dir("build_20260201_000000_000_cccccc");
        fs::write(built.join(INDEX_FILE), "<html>").unwrap();
        fs::create_dir_all(layout.runs_dir.join(".staging-xyz")).unwrap();
        fs::write(layout.runs_dir.join("notes.txt"), "x").unwrap();

        let runs = registry.list().unwrap();
        let ids: Vec<_> = runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "build_20260301_000000_000_bbbbbb",
                "build_20260201_000000_000_cccccc",
                "build_20260101_000000_000_aaaaaa",
            ]
        );
        assert!(runs[1].has_build);
        assert!(!runs[0].has_build && !runs[0].has_seed);
    }

    #[test]
    fn test_get_partial_run() {
        let (_dir, layout, registry) = registry();
        let run = layout.run_dir("build_x");
        fs::create_dir_all(&run).unwrap();
        fs::write(run.join("visual.json"), r#"{"ui_theme": "dark"}"#).unwrap();

        let contents = registry.get("build_x").unwrap();
        assert_eq!(contents.visual, Some(serde_json::json!({"ui_theme": "dark"})));
        assert!(contents.mechanics.is_none() && contents.seed.is_none());
    }

    #[test]
    fn test_unknown_runs() {
        let (_dir, _layout, registry) = registry();
        assert!(matches!(registry.get("build_missing"), Err(CoreError::RunNotFound(_))));
        assert!(matches!(registry.get("../runs"), Err(CoreError::RunNotFound(_))));
        assert!(matches!(registry.play_file("build_missing"), Err(CoreError::RunNotFound(_))));
    }
}
