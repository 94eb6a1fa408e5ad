//! Pipeline - single entry point for the routing layer
//!
//! CRITICAL: every raw config that reaches the builder, the randomizer or a
//! generator round-trip passes through [`Validator::validate`]. No bypass.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::{AssetInfo, AssetSlot, AssetStore, WrittenAsset};
use crate::builder::{AppliedRequests, BuildRequest, RunBuilder, RunHandle};
use crate::collaborators::{ContentGenerator, ImageGenerator, Instruction};
use crate::error::{CoreError, CoreResult, FieldViolation, ValidationError};
use crate::layout::{DefaultConfigs, ProjectLayout};
use crate::randomize;
use crate::registry::{RunContents, RunRegistry, RunSummary};
use crate::schema::{LevelsConfig, Section, ValidatedConfig};
use crate::validation::{validate_seed, Validator};

/// Largest seed drawn when the caller does not supply one.
pub const MAX_DRAWN_SEED: u64 = 1 << 31;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Randomized {
    pub section: Section,
    pub seed: u64,
    pub variation: f64,
    pub config: ValidatedConfig,
}

/// Raw, not yet validated build input as the routing layer decodes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBuild {
    pub mechanics: Value,
    pub levels: Value,
    pub visual: Value,
    #[serde(default)]
    pub seed: Option<Value>,
    #[serde(default)]
    pub applied: Option<AppliedRequests>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLevel {
    pub levels: LevelsConfig,
    pub level_index: usize,
    pub solve_sequence: Vec<String>,
}

pub struct Pipeline {
    layout: ProjectLayout,
    validator: Validator,
    assets: AssetStore,
    builder: RunBuilder,
    registry: RunRegistry,
}

impl Pipeline {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            validator: Validator::new(),
            assets: AssetStore::new(&layout),
            builder: RunBuilder::new(&layout),
            registry: RunRegistry::new(&layout),
            layout,
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Create the directory tree and any missing placeholder assets.
    pub fn startup(&self) -> CoreResult<Vec<AssetSlot>> {
        self.layout.ensure_dirs()?;
        self.ensure_placeholders()
    }

    pub fn ensure_placeholders(&self) -> CoreResult<Vec<AssetSlot>> {
        let visual = self.layout.default_visual(&self.validator);
        self.assets.ensure_placeholders(visual.as_ref())
    }

    pub fn load_defaults(&self) -> CoreResult<DefaultConfigs> {
        self.layout.load_defaults(&self.validator)
    }

    /// This is the ONLY validation entry point for raw section data.
    pub fn validate(&self, section: Section, raw: &Value) -> CoreResult<ValidatedConfig> {
        Ok(self.validator.validate(section, raw)?)
    }

    /// Validate, then randomize. Draws a seed in `[0, 2^31]` when none is given.
    pub fn randomize(
        &self,
        section: Section,
        raw: &Value,
        variation: f64,
        seed: Option<u64>,
    ) -> CoreResult<Randomized> {
        let config = self.validate(section, raw)?;
        let seed = seed.unwrap_or_else(|| rand::rng().random_range(0..=MAX_DRAWN_SEED));
        let config = randomize::randomize(&self.validator, &config, variation, seed)?;
        Ok(Randomized {
            section,
            seed,
            variation,
            config,
        })
    }

    /// Validate all three sections and the optional seed record, then build.
    pub fn build(&self, raw: &RawBuild) -> CoreResult<RunHandle> {
        let mechanics = self.validate(Section::Mechanics, &raw.mechanics)?;
        let levels = self.validate(Section::Levels, &raw.levels)?;
        let visual = self.validate(Section::Visual, &raw.visual)?;
        let seed = raw.seed.as_ref().map(validate_seed).transpose()?;

        let mut request = typed_request(mechanics, levels, visual)?;
        request.seed = seed;
        request.applied = raw.applied.clone();

        self.builder.build(&self.assets, &request)
    }

    /// Build from typed configs. Each section is run back through the
    /// validator first; typed values can still hold out-of-range numbers.
    pub fn build_validated(&self, request: &BuildRequest) -> CoreResult<RunHandle> {
        let mechanics = self
            .validator
            .revalidate(&ValidatedConfig::Mechanics(request.mechanics.clone()))?;
        let levels = self
            .validator
            .revalidate(&ValidatedConfig::Levels(request.levels.clone()))?;
        let visual = self
            .validator
            .revalidate(&ValidatedConfig::Visual(request.visual.clone()))?;

        let mut checked = typed_request(mechanics, levels, visual)?;
        checked.seed = request.seed.clone();
        checked.applied = request.applied.clone();

        self.builder.build(&self.assets, &checked)
    }

    pub fn list_runs(&self) -> CoreResult<Vec<RunSummary>> {
        self.registry.list()
    }

    pub fn get_run(&self, run_id: &str) -> CoreResult<RunContents> {
        self.registry.get(run_id)
    }

    pub fn list_assets(&self) -> CoreResult<Vec<AssetInfo>> {
        self.assets.list()
    }

    pub fn write_asset(&self, slot_name: &str, bytes: &[u8]) -> CoreResult<WrittenAsset> {
        self.assets.write(slot_name, bytes)
    }

    /// Ask a generator for a new layout of one level (1-based) and return
    /// the whole levels section with that layout swapped in, re-validated.
    ///
    /// The level keeps its current grid; generators do not size the grid.
    pub fn generate_level_layout(
        &self,
        generator: &dyn ContentGenerator,
        levels: &LevelsConfig,
        level_number: usize,
        instruction: &Instruction,
    ) -> CoreResult<GeneratedLevel> {
        let found = level_number
            .checked_sub(1)
            .and_then(|i| levels.levels.get(i).map(|level| (i, level)));
        let Some((level_index, level)) = found else {
            return Err(ValidationError::single(
                Section::Levels.as_str(),
                FieldViolation::new("level_number", "no such level")
                    .expected(format!("1..={}", levels.levels.len()))
                    .actual(level_number.to_string()),
            )
            .into());
        };

        let context = serde_json::to_value(level)?;
        let generated = generator
            .generate_layout(instruction, &context)
            .map_err(CoreError::Generator)?;

        let solve_sequence = generated
            .get("solve_sequence")
            .and_then(|s| serde_json::from_value::<Vec<String>>(s.clone()).ok())
            .unwrap_or_default();

        let mut layout = generated;
        if let Some(obj) = layout.as_object_mut() {
            obj.remove("solve_sequence");
            obj.insert("grid".to_string(), serde_json::to_value(&level.layout.grid)?);
        }

        let mut raw_levels = serde_json::to_value(levels)?;
        raw_levels["levels"][level_index]["layout"] = layout;
        let levels = self
            .validate(Section::Levels, &raw_levels)?
            .into_levels()
            .ok_or_else(|| CoreError::section_mismatch(Section::Levels))?;

        tracing::info!(
            level_number,
            cards = levels.levels[level_index].layout.tableau.len(),
            "applied generated layout"
        );
        Ok(GeneratedLevel {
            levels,
            level_index,
            solve_sequence,
        })
    }

    /// Ask a generator for an updated section and validate what comes back.
    pub fn apply_generated_section(
        &self,
        generator: &dyn ContentGenerator,
        current: &ValidatedConfig,
        instruction: &Instruction,
    ) -> CoreResult<ValidatedConfig> {
        let section = current.section();
        let raw = current.to_value()?;
        let updated = generator
            .update_section(section, instruction, &raw)
            .map_err(CoreError::Generator)?;

        let validated = self.validate(section, &updated).map_err(|e| {
            tracing::warn!(%section, error = %e, "generated config rejected");
            e
        })?;
        tracing::info!(%section, "applied generated config");
        Ok(validated)
    }

    /// Generate a replacement image for a slot, using the current file as
    /// reference, and store it at the slot's canonical size.
    pub fn regenerate_asset(
        &self,
        generator: &dyn ImageGenerator,
        slot_name: &str,
        prompt: &str,
    ) -> CoreResult<WrittenAsset> {
        let slot: AssetSlot = slot_name.parse()?;
        let references: Vec<Vec<u8>> = self.assets.read_slot(slot)?.into_iter().collect();

        let bytes = generator
            .generate_image(prompt, &references)
            .map_err(CoreError::Generator)?;
        tracing::info!(slot = %slot, bytes = bytes.len(), "generated asset image");

        self.assets.write(slot.name(), &bytes)
    }
}

fn typed_request(
    mechanics: ValidatedConfig,
    levels: ValidatedConfig,
    visual: ValidatedConfig,
) -> CoreResult<BuildRequest> {
    Ok(BuildRequest::new(
        mechanics
            .into_mechanics()
            .ok_or_else(|| CoreError::section_mismatch(Section::Mechanics))?,
        levels
            .into_levels()
            .ok_or_else(|| CoreError::section_mismatch(Section::Levels))?,
        visual
            .into_visual()
            .ok_or_else(|| CoreError::section_mismatch(Section::Visual))?,
    ))
}
