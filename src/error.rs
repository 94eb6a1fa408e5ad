//! Error taxonomy shared by every component.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// One failing field. `field` is a dotted path such as `levels[0].layout.grid.cell_width`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(expected) = &self.expected {
            write!(f, " (expected {}", expected)?;
            match &self.actual {
                Some(actual) => write!(f, ", got {})", actual)?,
                None => write!(f, ")")?,
            }
        }
        Ok(())
    }
}

/// Every offending field of a rejected section, never just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub section: String,
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new(section: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self {
            section: section.into(),
            violations,
        }
    }

    pub fn single(section: impl Into<String>, violation: FieldViolation) -> Self {
        Self::new(section, vec![violation])
    }

    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{} config invalid: {}", self.section, messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown asset slot '{0}'")]
    UnknownAssetSlot(String),

    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("Run '{0}' not found")]
    RunNotFound(String),

    #[error("Build template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("Build failed: {context}: {source}")]
    BuildFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Content generation failed: {0}")]
    Generator(String),

    #[error("Default config missing: {}", .0.display())]
    DefaultsMissing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn build_failed<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CoreError::BuildFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn section_mismatch(section: crate::schema::Section) -> Self {
        Self::build_failed(
            format!("validating {}", section),
            "validator returned a different section",
        )
    }

    /// Caller errors the routing layer can report back without retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::UnknownAssetSlot(_)
                | CoreError::InvalidImageData(_)
                | CoreError::RunNotFound(_)
        )
    }
}
