//! Configuration Schema - Mechanics, Levels, Visual
//!
//! Closed shapes of the three configuration sections. Deserialization fills
//! defaults and ignores unknown fields; range and membership checks live in
//! [`crate::validation`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::AssetSlot;

/// Inclusive integer range declared for a bounded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min as i64 && value <= self.max as i64
    }

    pub fn clamp(&self, value: i64) -> u32 {
        value.clamp(self.min as i64, self.max as i64) as u32
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

pub const TOTAL_LEVELS_RANGE: IntRange = IntRange::new(1, 100);
pub const ENTER_DURATION_RANGE: IntRange = IntRange::new(400, 2000);
pub const CELL_WIDTH_RANGE: IntRange = IntRange::new(56, 110);
pub const CELL_HEIGHT_RANGE: IntRange = IntRange::new(76, 150);
pub const SCREEN_DURATION_RANGE: IntRange = IntRange::new(1000, 5000);
pub const TRANSITION_DURATION_RANGE: IntRange = IntRange::new(500, 3000);
pub const FONT_SIZE_RANGE: IntRange = IntRange::new(10, 48);
pub const CORNER_RADIUS_RANGE: IntRange = IntRange::new(0, 16);
pub const FLIP_DURATION_RANGE: IntRange = IntRange::new(100, 1000);

pub const GAME_TYPE: &str = "solitaire_simplified";

// --- Sections ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Mechanics,
    Levels,
    Visual,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Mechanics, Section::Levels, Section::Visual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Mechanics => "mechanics",
            Section::Levels => "levels",
            Section::Visual => "visual",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Section::Mechanics => "mechanics.json",
            Section::Levels => "levels.json",
            Section::Visual => "visual.json",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| {
                format!("unknown section '{}' (expected mechanics, levels or visual)", s)
            })
    }
}

/// A closed set of string options. `ALL` is the enum's full domain.
pub trait Choice: Copy + PartialEq + Sized + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Tap,
    Drag,
    Both,
}

impl Choice for InputType {
    const ALL: &'static [Self] = &[InputType::Tap, InputType::Drag, InputType::Both];

    fn as_str(&self) -> &'static str {
        match self {
            InputType::Tap => "tap",
            InputType::Drag => "drag",
            InputType::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardMoveSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl Choice for CardMoveSpeed {
    const ALL: &'static [Self] = &[CardMoveSpeed::Slow, CardMoveSpeed::Medium, CardMoveSpeed::Fast];

    fn as_str(&self) -> &'static str {
        match self {
            CardMoveSpeed::Slow => "slow",
            CardMoveSpeed::Medium => "medium",
            CardMoveSpeed::Fast => "fast",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    Slide,
    #[default]
    Flip,
    Instant,
}

impl Choice for AnimationType {
    const ALL: &'static [Self] =
        &[AnimationType::Slide, AnimationType::Flip, AnimationType::Instant];

    fn as_str(&self) -> &'static str {
        match self {
            AnimationType::Slide => "slide",
            AnimationType::Flip => "flip",
            AnimationType::Instant => "instant",
        }
    }
}

/// How cards animate into the scene at the start of a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnterAnimation {
    /// Each card flies in from a random off-screen position, bottom rows first.
    #[default]
    ShuffleIn,
    /// All cards fall from above into position, bottom rows first.
    DropDown,
    /// All cards move together as one unit.
    Bulk,
}

impl Choice for EnterAnimation {
    const ALL: &'static [Self] = &[
        EnterAnimation::ShuffleIn,
        EnterAnimation::DropDown,
        EnterAnimation::Bulk,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            EnterAnimation::ShuffleIn => "shuffle_in",
            EnterAnimation::DropDown => "drop_down",
            EnterAnimation::Bulk => "bulk",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBackPattern {
    #[default]
    Solid,
    Stripes,
    Dots,
}

impl Choice for CardBackPattern {
    const ALL: &'static [Self] =
        &[CardBackPattern::Solid, CardBackPattern::Stripes, CardBackPattern::Dots];

    fn as_str(&self) -> &'static str {
        match self {
            CardBackPattern::Solid => "solid",
            CardBackPattern::Stripes => "stripes",
            CardBackPattern::Dots => "dots",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    #[default]
    Dark,
    Classic,
    Minimal,
}

impl Choice for UiTheme {
    const ALL: &'static [Self] = &[UiTheme::Dark, UiTheme::Classic, UiTheme::Minimal];

    fn as_str(&self) -> &'static str {
        match self {
            UiTheme::Dark => "dark",
            UiTheme::Classic => "classic",
            UiTheme::Minimal => "minimal",
        }
    }
}

// --- Mechanics ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanicsConfig {
    pub mechanics_version: String,
    pub genre: String,
    pub input_type: InputType,
    pub card_move_speed: CardMoveSpeed,
    pub animation_type: AnimationType,
    pub highlight_valid_moves: bool,
    pub auto_complete_enabled: bool,
    pub notes: String,
}

impl Default for MechanicsConfig {
    fn default() -> Self {
        Self {
            mechanics_version: "1.0".to_string(),
            genre: GAME_TYPE.to_string(),
            input_type: InputType::Tap,
            card_move_speed: CardMoveSpeed::Medium,
            animation_type: AnimationType::Flip,
            highlight_valid_moves: true,
            auto_complete_enabled: false,
            notes: String::new(),
        }
    }
}

// --- Levels ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableauCard {
    /// Card code, e.g. `7H`, `AS`, `10D`.
    pub code: String,
    #[serde(default = "default_true")]
    pub face_up: bool,
    pub col: u32,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Horizontal centre of the grid as a fraction of stage width.
    pub origin_x: f64,
    /// Top of the grid as a fraction of stage height.
    pub origin_y: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_width: 76,
            cell_height: 100,
            origin_x: 0.5,
            origin_y: 0.18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub foundation_card: String,
    pub tableau: Vec<TableauCard>,
    #[serde(default)]
    pub draw_pile: Vec<String>,
    #[serde(default)]
    pub grid: GridConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTimings {
    pub win_screen_duration_ms: u32,
    pub fail_screen_duration_ms: u32,
    pub level_transition_duration_ms: u32,
}

impl Default for LevelTimings {
    fn default() -> Self {
        Self {
            win_screen_duration_ms: 2000,
            fail_screen_duration_ms: 2000,
            level_transition_duration_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level_id: u32,
    #[serde(default = "default_game_type")]
    pub game_type: String,
    #[serde(default = "default_true")]
    pub show_draw_pile: bool,
    #[serde(default)]
    pub enter_animation: EnterAnimation,
    #[serde(default = "default_enter_duration")]
    pub enter_duration_ms: u32,
    pub layout: LevelLayout,
    #[serde(default)]
    pub timings: LevelTimings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsConfig {
    #[serde(default = "default_version")]
    pub levels_version: String,
    #[serde(default = "default_game_type")]
    pub genre: String,
    /// Show the HUD debug overlay. Hidden in production builds.
    #[serde(default)]
    pub testing_mode: bool,
    pub total_levels: u32,
    #[serde(default = "default_target_url")]
    pub target_url: String,
    #[serde(default = "default_cta_text")]
    pub cta_text: String,
    pub levels: Vec<LevelConfig>,
}

fn default_true() -> bool { true }
fn default_version() -> String { "1.0".to_string() }
fn default_game_type() -> String { GAME_TYPE.to_string() }
fn default_enter_duration() -> u32 { 1200 }
fn default_target_url() -> String { "https://yourapp.link/download".to_string() }
fn default_cta_text() -> String { "Play Now!".to_string() }

// --- Visual ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub visual_version: String,
    pub background_color: String,
    pub table_felt_color: String,
    pub card_face_color: String,
    pub card_back_color: String,
    pub card_back_pattern: CardBackPattern,
    pub card_border_color: String,
    pub highlight_color: String,
    pub button_color: String,
    pub button_text_color: String,
    pub primary_text_color: String,
    pub font_family: String,
    pub font_size_px: u32,
    pub card_corner_radius_px: u32,
    pub card_flip_duration_ms: u32,
    pub ui_theme: UiTheme,

    // Derived at build time from the asset store; never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_back_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub felt_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit_spade_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit_heart_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit_diamond_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit_club_image: Option<String>,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            visual_version: "1.0".to_string(),
            background_color: "#1a472a".to_string(),
            table_felt_color: "#15803d".to_string(),
            card_face_color: "#ffffff".to_string(),
            card_back_color: "#1a237e".to_string(),
            card_back_pattern: CardBackPattern::Solid,
            card_border_color: "#333333".to_string(),
            highlight_color: "#ffeb3b".to_string(),
            button_color: "#ff5722".to_string(),
            button_text_color: "#ffffff".to_string(),
            primary_text_color: "#ffffff".to_string(),
            font_family: "Arial, sans-serif".to_string(),
            font_size_px: 16,
            card_corner_radius_px: 6,
            card_flip_duration_ms: 300,
            ui_theme: UiTheme::Dark,
            background_image: None,
            card_back_image: None,
            felt_image: None,
            suit_spade_image: None,
            suit_heart_image: None,
            suit_diamond_image: None,
            suit_club_image: None,
        }
    }
}

impl VisualConfig {
    /// Names of the colour fields, in randomization order.
    pub const COLOR_FIELDS: [&'static str; 9] = [
        "background_color",
        "table_felt_color",
        "card_face_color",
        "card_back_color",
        "card_border_color",
        "highlight_color",
        "button_color",
        "button_text_color",
        "primary_text_color",
    ];

    pub fn color_fields_mut(&mut self) -> [&mut String; 9] {
        [
            &mut self.background_color,
            &mut self.table_felt_color,
            &mut self.card_face_color,
            &mut self.card_back_color,
            &mut self.card_border_color,
            &mut self.highlight_color,
            &mut self.button_color,
            &mut self.button_text_color,
            &mut self.primary_text_color,
        ]
    }

    fn slot_image_mut(&mut self, slot: AssetSlot) -> &mut Option<String> {
        match slot {
            AssetSlot::Background => &mut self.background_image,
            AssetSlot::CardBack => &mut self.card_back_image,
            AssetSlot::Felt => &mut self.felt_image,
            AssetSlot::SuitSpade => &mut self.suit_spade_image,
            AssetSlot::SuitHeart => &mut self.suit_heart_image,
            AssetSlot::SuitDiamond => &mut self.suit_diamond_image,
            AssetSlot::SuitClub => &mut self.suit_club_image,
        }
    }

    pub fn slot_image(&self, slot: AssetSlot) -> Option<&str> {
        match slot {
            AssetSlot::Background => self.background_image.as_deref(),
            AssetSlot::CardBack => self.card_back_image.as_deref(),
            AssetSlot::Felt => self.felt_image.as_deref(),
            AssetSlot::SuitSpade => self.suit_spade_image.as_deref(),
            AssetSlot::SuitHeart => self.suit_heart_image.as_deref(),
            AssetSlot::SuitDiamond => self.suit_diamond_image.as_deref(),
            AssetSlot::SuitClub => self.suit_club_image.as_deref(),
        }
    }

    pub fn set_slot_image(&mut self, slot: AssetSlot, encoded: String) {
        *self.slot_image_mut(slot) = Some(encoded);
    }

    /// Copy with every derived image payload removed, as persisted to `visual.json`.
    pub fn without_slot_images(&self) -> Self {
        let mut stripped = self.clone();
        for slot in AssetSlot::ALL {
            *stripped.slot_image_mut(slot) = None;
        }
        stripped
    }

    /// Colour used for a slot's placeholder image, if the slot has one.
    pub fn placeholder_color(&self, slot: AssetSlot) -> Option<&str> {
        match slot {
            AssetSlot::Background => Some(&self.background_color),
            AssetSlot::CardBack => Some(&self.card_back_color),
            AssetSlot::Felt => Some(&self.table_felt_color),
            _ => None,
        }
    }
}

// --- Seed record ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedValues {
    #[serde(default)]
    pub mechanics: Option<u64>,
    #[serde(default)]
    pub levels: Option<u64>,
    #[serde(default)]
    pub visual: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationAmounts {
    pub mechanics: f64,
    pub levels: f64,
    pub visual: f64,
}

impl Default for VariationAmounts {
    fn default() -> Self {
        Self {
            mechanics: 0.3,
            levels: 0.3,
            visual: 0.3,
        }
    }
}

/// Audit record of which seed and variation produced a randomized config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub seed_version: String,
    pub created_at: String,
    pub seeds: SeedValues,
    pub variation_amounts: VariationAmounts,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed_version: "1.0".to_string(),
            created_at: String::new(),
            seeds: SeedValues::default(),
            variation_amounts: VariationAmounts::default(),
        }
    }
}

impl SeedConfig {
    pub fn record(&mut self, section: Section, seed: u64, variation: f64) {
        match section {
            Section::Mechanics => {
                self.seeds.mechanics = Some(seed);
                self.variation_amounts.mechanics = variation;
            }
            Section::Levels => {
                self.seeds.levels = Some(seed);
                self.variation_amounts.levels = variation;
            }
            Section::Visual => {
                self.seeds.visual = Some(seed);
                self.variation_amounts.visual = variation;
            }
        }
    }
}

// --- Validated wrapper ---

/// A section that has passed [`crate::validation::Validator::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidatedConfig {
    Mechanics(MechanicsConfig),
    Levels(LevelsConfig),
    Visual(VisualConfig),
}

impl ValidatedConfig {
    pub fn section(&self) -> Section {
        match self {
            ValidatedConfig::Mechanics(_) => Section::Mechanics,
            ValidatedConfig::Levels(_) => Section::Levels,
            ValidatedConfig::Visual(_) => Section::Visual,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn into_mechanics(self) -> Option<MechanicsConfig> {
        match self {
            ValidatedConfig::Mechanics(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_levels(self) -> Option<LevelsConfig> {
        match self {
            ValidatedConfig::Levels(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_visual(self) -> Option<VisualConfig> {
        match self {
            ValidatedConfig::Visual(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_parse() {
        assert_eq!("levels".parse::<Section>().unwrap(), Section::Levels);
        assert!("audio".parse::<Section>().is_err());
    }

    #[test]
    fn test_enum_names_match_serde() {
        for anim in EnterAnimation::ALL {
            let encoded = serde_json::to_value(anim).unwrap();
            assert_eq!(encoded, json!(anim.as_str()));
        }
    }

    #[test]
    fn test_visual_without_slot_images() {
        let mut visual = VisualConfig::default();
        visual.set_slot_image(AssetSlot::Background, "abc".to_string());
        assert_eq!(visual.slot_image(AssetSlot::Background), Some("abc"));

        let stripped = visual.without_slot_images();
        let value = serde_json::to_value(&stripped).unwrap();
        assert!(value.get("background_image").is_none());
    }

    #[test]
    fn test_seed_record() {
        let mut seed = SeedConfig::default();
        seed.record(Section::Visual, 42, 0.7);
        assert_eq!(seed.seeds.visual, Some(42));
        assert_eq!(seed.variation_amounts.visual, 0.7);
        assert_eq!(seed.seeds.mechanics, None);
    }
}
