//! External content and image generators.
//!
//! The core only defines what it sends and receives. Anything a generator
//! returns is treated as untrusted and goes back through the validator
//! (configs) or the asset store (images) before it is used.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Section;

/// Operator instruction: free text, an annotated screenshot, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default)]
    pub text: Option<String>,
    /// PNG bytes of an annotated screenshot.
    #[serde(default, skip)]
    pub image: Option<Vec<u8>>,
}

impl Instruction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }
}

/// A text/vision model producing level layouts or whole config sections.
pub trait ContentGenerator {
    /// Returns a layout object: `foundation_card`, `tableau`, `draw_pile`
    /// and optionally `solve_sequence`.
    fn generate_layout(&self, instruction: &Instruction, context: &Value) -> Result<Value, String>;

    /// Returns the complete updated section object.
    fn update_section(
        &self,
        section: Section,
        instruction: &Instruction,
        current: &Value,
    ) -> Result<Value, String>;
}

/// An image model returning raster bytes in any format the `image` crate decodes.
pub trait ImageGenerator {
    fn generate_image(&self, prompt: &str, references: &[Vec<u8>]) -> Result<Vec<u8>, String>;
}
