//! Validation System - Section Rules
//!
//! Rules walk the raw JSON of one section and report every violation they
//! find. Only input with zero violations is decoded into the typed schema.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FieldViolation, ValidationError};
use crate::schema::{
    AnimationType, CardBackPattern, CardMoveSpeed, Choice, EnterAnimation, InputType, IntRange,
    LevelsConfig, MechanicsConfig, Section, SeedConfig, UiTheme, ValidatedConfig, VisualConfig,
    CELL_HEIGHT_RANGE, CELL_WIDTH_RANGE, CORNER_RADIUS_RANGE, ENTER_DURATION_RANGE,
    FLIP_DURATION_RANGE, FONT_SIZE_RANGE, GAME_TYPE, SCREEN_DURATION_RANGE, TOTAL_LEVELS_RANGE,
    TRANSITION_DURATION_RANGE,
};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

/// Section rule trait - produces violations for one section's raw JSON.
pub trait SectionRule: Send + Sync {
    fn section(&self) -> Section;
    fn check(&self, raw: &Map<String, Value>, out: &mut Vec<FieldViolation>);
}

// --- Field checks ---

/// Collects violations for the fields of one JSON object.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    fn new(obj: &'a Map<String, Value>, prefix: impl Into<String>) -> Self {
        Self { obj, prefix: prefix.into() }
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix, name)
        }
    }

    /// `None` when the field is absent; reports it first if it is required.
    fn get(&self, name: &str, required: bool, out: &mut Vec<FieldViolation>) -> Option<&'a Value> {
        match self.obj.get(name) {
            Some(value) => Some(value),
            None => {
                if required {
                    out.push(FieldViolation::new(self.path(name), "field required"));
                }
                None
            }
        }
    }

    fn string(&self, name: &str, required: bool, out: &mut Vec<FieldViolation>) -> Option<&'a str> {
        let value = self.get(name, required, out)?;
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                out.push(type_mismatch(self.path(name), "string", value));
                None
            }
        }
    }

    fn non_empty_string(&self, name: &str, required: bool, out: &mut Vec<FieldViolation>) {
        if let Some(s) = self.string(name, required, out) {
            if s.trim().is_empty() {
                out.push(
                    FieldViolation::new(self.path(name), "must not be empty")
                        .expected("non-empty string"),
                );
            }
        }
    }

    fn literal(&self, name: &str, literal: &str, out: &mut Vec<FieldViolation>) {
        if let Some(s) = self.string(name, false, out) {
            if s != literal {
                out.push(
                    FieldViolation::new(self.path(name), "unexpected value")
                        .expected(literal)
                        .actual(s),
                );
            }
        }
    }

    fn boolean(&self, name: &str, required: bool, out: &mut Vec<FieldViolation>) {
        if let Some(value) = self.get(name, required, out) {
            if !value.is_boolean() {
                out.push(type_mismatch(self.path(name), "boolean", value));
            }
        }
    }

    fn integer(
        &self,
        name: &str,
        range: Option<IntRange>,
        required: bool,
        out: &mut Vec<FieldViolation>,
    ) {
        let Some(value) = self.get(name, required, out) else {
            return;
        };
        let Some(n) = value.as_i64() else {
            out.push(type_mismatch(self.path(name), "integer", value));
            return;
        };
        let range = range.unwrap_or(IntRange::new(0, u32::MAX));
        if !range.contains(n) {
            out.push(
                FieldViolation::new(self.path(name), "out of range")
                    .expected(range.to_string())
                    .actual(n.to_string()),
            );
        }
    }

    fn fraction(&self, name: &str, out: &mut Vec<FieldViolation>) {
        let Some(value) = self.get(name, false, out) else {
            return;
        };
        match value.as_f64() {
            Some(x) if (0.0..=1.0).contains(&x) => {}
            Some(x) => out.push(
                FieldViolation::new(self.path(name), "out of range")
                    .expected("[0, 1]")
                    .actual(x.to_string()),
            ),
            None => out.push(type_mismatch(self.path(name), "number", value)),
        }
    }

    fn choice<T: Choice>(&self, name: &str, out: &mut Vec<FieldViolation>) {
        if let Some(s) = self.string(name, false, out) {
            if !T::ALL.iter().any(|c| c.as_str() == s) {
                out.push(
                    FieldViolation::new(self.path(name), "not a permitted value")
                        .expected(T::names().join(" | "))
                        .actual(s),
                );
            }
        }
    }

    fn object(
        &self,
        name: &str,
        required: bool,
        out: &mut Vec<FieldViolation>,
    ) -> Option<Fields<'a>> {
        let value = self.get(name, required, out)?;
        match value.as_object() {
            Some(obj) => Some(Fields::new(obj, self.path(name))),
            None => {
                out.push(type_mismatch(self.path(name), "object", value));
                None
            }
        }
    }

    fn array(
        &self,
        name: &str,
        required: bool,
        out: &mut Vec<FieldViolation>,
    ) -> Option<&'a Vec<Value>> {
        let value = self.get(name, required, out)?;
        match value.as_array() {
            Some(items) => Some(items),
            None => {
                out.push(type_mismatch(self.path(name), "array", value));
                None
            }
        }
    }
}

fn type_mismatch(field: String, expected: &str, actual: &Value) -> FieldViolation {
    FieldViolation::new(field, "wrong type")
        .expected(expected)
        .actual(json_type_name(actual))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// --- Concrete Rules ---

pub struct MechanicsRule;

impl SectionRule for MechanicsRule {
    fn section(&self) -> Section { Section::Mechanics }

    fn check(&self, raw: &Map<String, Value>, out: &mut Vec<FieldViolation>) {
        let f = Fields::new(raw, "");
        f.string("mechanics_version", false, out);
        f.string("genre", false, out);
        f.choice::<InputType>("input_type", out);
        f.choice::<CardMoveSpeed>("card_move_speed", out);
        f.choice::<AnimationType>("animation_type", out);
        f.boolean("highlight_valid_moves", false, out);
        f.boolean("auto_complete_enabled", false, out);
        f.string("notes", false, out);
    }
}

pub struct VisualRule;

impl SectionRule for VisualRule {
    fn section(&self) -> Section { Section::Visual }

    fn check(&self, raw: &Map<String, Value>, out: &mut Vec<FieldViolation>) {
        let f = Fields::new(raw, "");
        f.string("visual_version", false, out);
        for name in VisualConfig::COLOR_FIELDS {
            f.non_empty_string(name, false, out);
        }
        f.choice::<CardBackPattern>("card_back_pattern", out);
        f.choice::<UiTheme>("ui_theme", out);
        f.string("font_family", false, out);
        f.integer("font_size_px", Some(FONT_SIZE_RANGE), false, out);
        f.integer("card_corner_radius_px", Some(CORNER_RADIUS_RANGE), false, out);
        f.integer("card_flip_duration_ms", Some(FLIP_DURATION_RANGE), false, out);
        for slot in crate::assets::AssetSlot::ALL {
            f.string(&slot.image_field(), false, out);
        }
    }
}

pub struct LevelsRule;

impl LevelsRule {
    fn check_level(level: &Fields<'_>, out: &mut Vec<FieldViolation>) {
        level.integer("level_id", None, true, out);
        level.literal("game_type", GAME_TYPE, out);
        level.boolean("show_draw_pile", false, out);
        level.choice::<EnterAnimation>("enter_animation", out);
        level.integer("enter_duration_ms", Some(ENTER_DURATION_RANGE), false, out);

        if let Some(layout) = level.object("layout", true, out) {
            layout.non_empty_string("foundation_card", true, out);

            if let Some(cards) = layout.array("tableau", true, out) {
                for (i, card) in cards.iter().enumerate() {
                    let path = format!("{}[{}]", layout.path("tableau"), i);
                    let Some(obj) = card.as_object() else {
                        out.push(type_mismatch(path, "object", card));
                        continue;
                    };
                    let card = Fields::new(obj, path);
                    card.non_empty_string("code", true, out);
                    card.boolean("face_up", false, out);
                    card.integer("col", None, true, out);
                    card.integer("row", None, true, out);
                }
            }

            if let Some(pile) = layout.array("draw_pile", false, out) {
                for (i, code) in pile.iter().enumerate() {
                    if !code.is_string() {
                        let path = format!("{}[{}]", layout.path("draw_pile"), i);
                        out.push(type_mismatch(path, "string", code));
                    }
                }
            }

            if let Some(grid) = layout.object("grid", false, out) {
                grid.integer("cell_width", Some(CELL_WIDTH_RANGE), false, out);
                grid.integer("cell_height", Some(CELL_HEIGHT_RANGE), false, out);
                grid.fraction("origin_x", out);
                grid.fraction("origin_y", out);
            }
        }

        if let Some(timings) = level.object("timings", false, out) {
            timings.integer("win_screen_duration_ms", Some(SCREEN_DURATION_RANGE), false, out);
            timings.integer("fail_screen_duration_ms", Some(SCREEN_DURATION_RANGE), false, out);
            timings.integer(
                "level_transition_duration_ms",
                Some(TRANSITION_DURATION_RANGE),
                false,
                out,
            );
        }
    }
}

impl SectionRule for LevelsRule {
    fn section(&self) -> Section { Section::Levels }

    fn check(&self, raw: &Map<String, Value>, out: &mut Vec<FieldViolation>) {
        let f = Fields::new(raw, "");
        f.string("levels_version", false, out);
        f.string("genre", false, out);
        f.boolean("testing_mode", false, out);
        f.integer("total_levels", Some(TOTAL_LEVELS_RANGE), true, out);
        f.string("target_url", false, out);
        f.string("cta_text", false, out);

        if let Some(levels) = f.array("levels", true, out) {
            for (i, level) in levels.iter().enumerate() {
                let path = format!("levels[{}]", i);
                match level.as_object() {
                    Some(obj) => Self::check_level(&Fields::new(obj, path), out),
                    None => out.push(type_mismatch(path, "object", level)),
                }
            }
        }
    }
}

/// Validator orchestrates the section rules
pub struct Validator {
    rules: Vec<Box<dyn SectionRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(MechanicsRule),
                Box::new(LevelsRule),
                Box::new(VisualRule),
            ],
        }
    }

    /// Validate one section's raw structured data.
    ///
    /// This is the ONLY way to obtain a [`ValidatedConfig`]. Unknown fields
    /// are ignored; missing fields with defaults are filled.
    pub fn validate(
        &self,
        section: Section,
        raw: &Value,
    ) -> Result<ValidatedConfig, ValidationError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let Some(obj) = raw.as_object() else {
            return Err(ValidationError::single(
                section.as_str(),
                type_mismatch("(root)".to_string(), "object", raw),
            ));
        };

        let mut violations = vec![];
        for rule in self.rules.iter().filter(|r| r.section() == section) {
            rule.check(obj, &mut violations);
        }
        if !violations.is_empty() {
            tracing::debug!(%section, count = violations.len(), "config rejected");
            return Err(ValidationError::new(section.as_str(), violations));
        }

        let config = match section {
            Section::Mechanics => {
                ValidatedConfig::Mechanics(decode::<MechanicsConfig>(section, raw)?)
            }
            Section::Levels => ValidatedConfig::Levels(decode::<LevelsConfig>(section, raw)?),
            Section::Visual => ValidatedConfig::Visual(decode::<VisualConfig>(section, raw)?),
        };
        Ok(config)
    }

    /// Run an already-typed config back through [`Validator::validate`].
    pub fn revalidate(&self, config: &ValidatedConfig) -> Result<ValidatedConfig, ValidationError> {
        let raw = config.to_value().map_err(|e| {
            ValidationError::single(
                config.section().as_str(),
                FieldViolation::new("(root)", e.to_string()),
            )
        })?;
        self.validate(config.section(), &raw)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(section: Section, raw: &Value) -> Result<T, ValidationError> {
    serde_json::from_value(raw.clone()).map_err(|e| {
        ValidationError::single(section.as_str(), FieldViolation::new("(root)", e.to_string()))
    })
}

/// Seed records are only shape-checked; they are never compared with the
/// configs they describe.
pub fn validate_seed(raw: &Value) -> Result<SeedConfig, ValidationError> {
    const SECTION: &str = "seed";
    let Some(obj) = raw.as_object() else {
        let violation = type_mismatch("(root)".to_string(), "object", raw);
        return Err(ValidationError::single(SECTION, violation));
    };

    let mut out = vec![];
    let f = Fields::new(obj, "");
    f.string("seed_version", false, &mut out);
    f.string("created_at", false, &mut out);
    if let Some(seeds) = f.object("seeds", false, &mut out) {
        for section in Section::ALL {
            let name = section.as_str();
            if let Some(value) = seeds.get(name, false, &mut out) {
                if !value.is_null() && value.as_u64().is_none() {
                    out.push(type_mismatch(seeds.path(name), "unsigned integer or null", value));
                }
            }
        }
    }
    if let Some(amounts) = f.object("variation_amounts", false, &mut out) {
        for section in Section::ALL {
            amounts.fraction(section.as_str(), &mut out);
        }
    }
    if !out.is_empty() {
        return Err(ValidationError::new(SECTION, out));
    }

    serde_json::from_value(raw.clone())
        .map_err(|e| ValidationError::single(SECTION, FieldViolation::new("(root)", e.to_string())))
}

/// Variation amounts are bounded to [0, 1].
pub fn check_variation(section: Section, variation: f64) -> Result<(), ValidationError> {
    if variation.is_finite() && (0.0..=1.0).contains(&variation) {
        return Ok(());
    }
    Err(ValidationError::single(
        section.as_str(),
        FieldViolation::new("variation", "out of range")
            .expected("[0, 1]")
            .actual(variation.to_string()),
    ))
}
