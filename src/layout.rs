//! Directory layout of a project root.
//!
//! Every component receives a `ProjectLayout` at construction instead of
//! reading process-wide paths, so tests can point the whole core at an
//! isolated temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::schema::{LevelsConfig, MechanicsConfig, Section, VisualConfig};
use crate::validation::Validator;

/// File name of the HTML engine template under the static directory.
pub const TEMPLATE_FILE: &str = "engine_template.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub defaults_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub static_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub history_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let static_dir = root.join("static");
        Self {
            defaults_dir: root.join("defaults"),
            runs_dir: root.join("runs"),
            assets_dir: static_dir.join("assets").join("project"),
            history_dir: static_dir.join("assets").join("history"),
            logs_dir: root.join("logs"),
            static_dir,
            root,
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.static_dir.join(TEMPLATE_FILE)
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(run_id)
    }

    /// Create every directory of the layout. Safe to call repeatedly.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        for dir in [
            &self.defaults_dir,
            &self.runs_dir,
            &self.static_dir,
            &self.assets_dir,
            &self.history_dir,
            &self.logs_dir,
        ] {
            fs::create_dir_all(dir)?;
        }
        tracing::debug!(root = %self.root.display(), "project directories ready");
        Ok(())
    }

    /// Load and validate `defaults/{mechanics,levels,visual}.json`.
    pub fn load_defaults(&self, validator: &Validator) -> CoreResult<DefaultConfigs> {
        let mechanics = self.load_default_section(validator, Section::Mechanics)?;
        let levels = self.load_default_section(validator, Section::Levels)?;
        let visual = self.load_default_section(validator, Section::Visual)?;

        Ok(DefaultConfigs {
            mechanics: mechanics
                .into_mechanics()
                .ok_or_else(|| CoreError::section_mismatch(Section::Mechanics))?,
            levels: levels
                .into_levels()
                .ok_or_else(|| CoreError::section_mismatch(Section::Levels))?,
            visual: visual
                .into_visual()
                .ok_or_else(|| CoreError::section_mismatch(Section::Visual))?,
        })
    }

    /// The visual defaults, if present and valid. Used for placeholder colours.
    pub fn default_visual(&self, validator: &Validator) -> Option<VisualConfig> {
        self.load_default_section(validator, Section::Visual)
            .ok()
            .and_then(|c| c.into_visual())
    }

    fn load_default_section(
        &self,
        validator: &Validator,
        section: Section,
    ) -> CoreResult<crate::schema::ValidatedConfig> {
        let path = self.defaults_dir.join(section.file_name());
        if !path.exists() {
            return Err(CoreError::DefaultsMissing(path));
        }
        let raw = read_json(&path)?;
        Ok(validator.validate(section, &raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultConfigs {
    pub mechanics: MechanicsConfig,
    pub levels: LevelsConfig,
    pub visual: VisualConfig,
}

pub(crate) fn read_json(path: &Path) -> CoreResult<serde_json::Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// On-disk JSON: UTF-8, 2-space indentation.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new("/tmp/proj");
        assert_eq!(layout.runs_dir, PathBuf::from("/tmp/proj/runs"));
        assert_eq!(
            layout.assets_dir,
            PathBuf::from("/tmp/proj/static/assets/project")
        );
        assert_eq!(
            layout.template_path(),
            PathBuf::from("/tmp/proj/static/engine_template.html")
        );
    }

    #[test]
    fn test_missing_defaults_reported() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure_dirs().unwrap();

        let err = layout.load_defaults(&Validator::new()).unwrap_err();
        assert!(matches!(err, CoreError::DefaultsMissing(p) if p.ends_with("mechanics.json")));
        assert!(layout.default_visual(&Validator::new()).is_none());
    }
}
