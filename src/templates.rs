//! Build Template - the HTML engine shell a run is rendered into
//!
//! A template is a single HTML file containing exactly one occurrence of
//! [`CONFIG_PLACEHOLDER`]. Rendering is one textual replacement of that
//! token with the minified JSON game document; there is no escaping.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

pub const CONFIG_PLACEHOLDER: &str = "__GAME_CONFIG__";

#[derive(Debug, Clone)]
pub struct BuildTemplate {
    source: Option<PathBuf>,
    html: String,
}

impl BuildTemplate {
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::TemplateMissing(path.to_path_buf()));
        }
        let html = fs::read_to_string(path)
            .map_err(|e| {
                CoreError::build_failed(format!("reading template {}", path.display()), e)
            })?;
        let mut template = Self::from_html(html)?;
        template.source = Some(path.to_path_buf());
        Ok(template)
    }

    pub fn from_html(html: impl Into<String>) -> CoreResult<Self> {
        let html = html.into();
        let occurrences = html.matches(CONFIG_PLACEHOLDER).count();
        if occurrences != 1 {
            return Err(CoreError::build_failed(
                "checking build template",
                format!(
                    "expected exactly one {} placeholder, found {}",
                    CONFIG_PLACEHOLDER, occurrences
                ),
            ));
        }
        Ok(Self { source: None, html })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Substitute the game document for the placeholder.
    pub fn render(&self, document: &str) -> CoreResult<String> {
        if document.contains(CONFIG_PLACEHOLDER) {
            return Err(CoreError::build_failed(
                "rendering build template",
                format!("game document contains the literal {}", CONFIG_PLACEHOLDER),
            ));
        }
        Ok(self.html.replacen(CONFIG_PLACEHOLDER, document, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<script>window.GAME_CONFIG = __GAME_CONFIG__;</script>";

    #[test]
    fn test_render_substitutes_once() {
        let template = BuildTemplate::from_html(HTML).unwrap();
        let out = template.render(r#"{"a":1}"#).unwrap();
        assert_eq!(out, r#"<script>window.GAME_CONFIG = {"a":1};</script>"#);
    }

    #[test]
    fn test_placeholder_count_enforced() {
        assert!(BuildTemplate::from_html("<html></html>").is_err());
        assert!(BuildTemplate::from_html(format!("{0}{0}", CONFIG_PLACEHOLDER)).is_err());
    }

    #[test]
    fn test_document_must_not_contain_placeholder() {
        let template = BuildTemplate::from_html(HTML).unwrap();
        let err = template.render(r#"{"notes":"__GAME_CONFIG__"}"#).unwrap_err();
        assert!(matches!(err, CoreError::BuildFailed { .. }));
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine_template.html");
        assert!(matches!(
            BuildTemplate::load(&path),
            Err(CoreError::TemplateMissing(p)) if p == path
        ));
    }
}
