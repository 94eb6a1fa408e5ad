//! Randomization Engine - seeded, bounded perturbation of one section
//!
//! Each call builds a fresh ChaCha8 generator from the seed, so the same
//! `(section, variation, seed)` triple always yields the same output.
//! Variation scales the probability or magnitude of a change, never its
//! direction. Card layouts (foundation, tableau, draw pile, grid origin)
//! are never touched.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::color::{Hsl, Rgb};
use crate::error::ValidationError;
use crate::schema::{
    Choice, LevelConfig, LevelsConfig, MechanicsConfig, Section, SeedConfig, ValidatedConfig,
    VisualConfig, CELL_HEIGHT_RANGE, CELL_WIDTH_RANGE, CORNER_RADIUS_RANGE, ENTER_DURATION_RANGE,
    FLIP_DURATION_RANGE, FONT_SIZE_RANGE, IntRange, SCREEN_DURATION_RANGE,
    TRANSITION_DURATION_RANGE,
};
use crate::validation::{check_variation, Validator};

const HUE_SPREAD: f64 = 0.3;
const SATURATION_SPREAD: f64 = 0.2;
const LIGHTNESS_SPREAD: f64 = 0.15;

// --- Field strategies ---

/// With probability `variation`, pick a different option uniformly.
pub fn vary_choice<T: Choice, R: Rng>(rng: &mut R, current: T, variation: f64) -> T {
    if rng.random::<f64>() < variation {
        let others: Vec<T> = T::ALL.iter().copied().filter(|o| *o != current).collect();
        others.choose(rng).copied().unwrap_or(current)
    } else {
        current
    }
}

/// With probability `variation`, invert.
pub fn vary_bool<R: Rng>(rng: &mut R, current: bool, variation: f64) -> bool {
    if rng.random::<f64>() < variation {
        !current
    } else {
        current
    }
}

/// Offset by a uniform integer in `[-delta, delta]`, `delta = floor((max - min) * variation)`,
/// then clamp into the range.
pub fn vary_int<R: Rng>(rng: &mut R, current: u32, range: IntRange, variation: f64) -> u32 {
    let delta = ((range.max - range.min) as f64 * variation).floor() as i64;
    let offset = rng.random_range(-delta..=delta);
    range.clamp(current as i64 + offset)
}

/// Uniform in `[-spread, spread]`.
fn jitter<R: Rng>(rng: &mut R, spread: f64) -> f64 {
    (rng.random::<f64>() * 2.0 - 1.0) * spread
}

/// Perturb a hex colour in HSL space. Unparseable input is returned unchanged.
pub fn vary_color<R: Rng>(rng: &mut R, current: &str, variation: f64) -> String {
    let Ok(rgb) = current.parse::<Rgb>() else {
        tracing::debug!(color = current, "leaving unparseable colour unchanged");
        return current.to_string();
    };

    let dh = jitter(rng, variation * HUE_SPREAD);
    let ds = jitter(rng, variation * SATURATION_SPREAD);
    let dl = jitter(rng, variation * LIGHTNESS_SPREAD);
    if variation <= 0.0 {
        return current.to_string();
    }

    let hsl = rgb.to_hsl();
    Hsl {
        h: (hsl.h + dh).rem_euclid(1.0),
        s: (hsl.s + ds).clamp(0.1, 1.0),
        l: (hsl.l + dl).clamp(0.1, 0.9),
    }
    .to_rgb()
    .to_hex()
}

// --- Per-section randomizers ---

pub fn randomize_mechanics(config: &MechanicsConfig, variation: f64, seed: u64) -> MechanicsConfig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    MechanicsConfig {
        input_type: vary_choice(&mut rng, config.input_type, variation),
        card_move_speed: vary_choice(&mut rng, config.card_move_speed, variation),
        animation_type: vary_choice(&mut rng, config.animation_type, variation),
        highlight_valid_moves: vary_bool(&mut rng, config.highlight_valid_moves, variation * 0.4),
        auto_complete_enabled: vary_bool(&mut rng, config.auto_complete_enabled, variation * 0.2),
        ..config.clone()
    }
}

pub fn randomize_visual(config: &VisualConfig, variation: f64, seed: u64) -> VisualConfig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = config.clone();

    for color in out.color_fields_mut() {
        *color = vary_color(&mut rng, color.as_str(), variation);
    }
    out.card_back_pattern = vary_choice(&mut rng, config.card_back_pattern, variation * 0.5);
    out.ui_theme = vary_choice(&mut rng, config.ui_theme, variation * 0.5);
    out.font_size_px = vary_int(&mut rng, config.font_size_px, FONT_SIZE_RANGE, variation * 0.3);
    out.card_corner_radius_px =
        vary_int(&mut rng, config.card_corner_radius_px, CORNER_RADIUS_RANGE, variation * 0.3);
    out.card_flip_duration_ms =
        vary_int(&mut rng, config.card_flip_duration_ms, FLIP_DURATION_RANGE, variation * 0.4);
    out
}

/// Varies enter animation, grid cell size and screen timings per level.
pub fn randomize_levels(config: &LevelsConfig, variation: f64, seed: u64) -> LevelsConfig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let levels = config
        .levels
        .iter()
        .map(|level| randomize_level(&mut rng, level, variation))
        .collect();

    LevelsConfig {
        levels,
        ..config.clone()
    }
}

fn randomize_level<R: Rng>(rng: &mut R, level: &LevelConfig, variation: f64) -> LevelConfig {
    let mut out = level.clone();
    out.enter_animation = vary_choice(rng, level.enter_animation, variation * 0.6);
    out.enter_duration_ms =
        vary_int(rng, level.enter_duration_ms, ENTER_DURATION_RANGE, variation * 0.4);

    let grid = &mut out.layout.grid;
    grid.cell_width = vary_int(rng, grid.cell_width, CELL_WIDTH_RANGE, variation * 0.3);
    grid.cell_height = vary_int(rng, grid.cell_height, CELL_HEIGHT_RANGE, variation * 0.3);

    let timings = &mut out.timings;
    timings.win_screen_duration_ms =
        vary_int(rng, timings.win_screen_duration_ms, SCREEN_DURATION_RANGE, variation * 0.4);
    timings.fail_screen_duration_ms =
        vary_int(rng, timings.fail_screen_duration_ms, SCREEN_DURATION_RANGE, variation * 0.4);
    timings.level_transition_duration_ms = vary_int(
        rng,
        timings.level_transition_duration_ms,
        TRANSITION_DURATION_RANGE,
        variation * 0.4,
    );
    out
}

// --- Entry points ---

/// Randomize one validated section and re-validate the result.
pub fn randomize(
    validator: &Validator,
    config: &ValidatedConfig,
    variation: f64,
    seed: u64,
) -> Result<ValidatedConfig, ValidationError> {
    let section = config.section();
    check_variation(section, variation)?;

    let randomized = match config {
        ValidatedConfig::Mechanics(c) => {
            ValidatedConfig::Mechanics(randomize_mechanics(c, variation, seed))
        }
        ValidatedConfig::Levels(c) => ValidatedConfig::Levels(randomize_levels(c, variation, seed)),
        ValidatedConfig::Visual(c) => ValidatedConfig::Visual(randomize_visual(c, variation, seed)),
    };
    tracing::debug!(%section, variation, seed, "randomized section");

    validator.revalidate(&randomized)
}

/// Randomize several sections at once, recording each seed and variation.
pub fn randomize_all(
    validator: &Validator,
    configs: &[ValidatedConfig],
    plan: &[(Section, f64, u64)],
    created_at: impl Into<String>,
) -> Result<(Vec<ValidatedConfig>, SeedConfig), ValidationError> {
    let mut record = SeedConfig {
        created_at: created_at.into(),
        ..SeedConfig::default()
    };
    let mut out = Vec::with_capacity(configs.len());

    for config in configs {
        let section = config.section();
        match plan.iter().find(|(s, _, _)| *s == section) {
            Some(&(_, variation, seed)) => {
                out.push(randomize(validator, config, variation, seed)?);
                record.record(section, seed, variation);
            }
            None => out.push(config.clone()),
        }
    }

    Ok((out, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InputType, UiTheme};

    #[test]
    fn test_vary_int_delta_bound() {
        // cell_width 76 in [56, 110] at 0.3: delta = floor(54 * 0.3) = 16.
        for seed in 0..500 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let v = vary_int(&mut rng, 76, CELL_WIDTH_RANGE, 0.3);
            assert!((60..=92).contains(&v), "seed {} gave {}", seed, v);
        }
    }

    #[test]
    fn test_vary_int_clamps() {
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let v = vary_int(&mut rng, 110, CELL_WIDTH_RANGE, 1.0);
            assert!(CELL_WIDTH_RANGE.contains(v as i64));
        }
    }

    #[test]
    fn test_vary_choice_always_changes_at_one() {
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert_ne!(vary_choice(&mut rng, InputType::Tap, 1.0), InputType::Tap);
        }
    }

    #[test]
    fn test_vary_color_keeps_unparseable() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(vary_color(&mut rng, "rebeccapurple", 1.0), "rebeccapurple");
    }

    #[test]
    fn test_vary_color_zero_variation_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert_eq!(vary_color(&mut rng, "#ffffff", 0.0), "#ffffff");
    }

    #[test]
    fn test_visual_changes_at_full_variation() {
        let visual = VisualConfig::default();
        let out = randomize_visual(&visual, 1.0, 42);
        assert_ne!(out.background_color, visual.background_color);
        assert_eq!(out.font_family, visual.font_family);
    }

    #[test]
    fn test_randomize_rejects_bad_variation() {
        let config = ValidatedConfig::Visual(VisualConfig::default());
        let err = randomize(&Validator::new(), &config, 1.5, 7).unwrap_err();
        assert_eq!(err.fields(), vec!["variation"]);
    }

    #[test]
    fn test_randomize_all_records_seeds() {
        let validator = Validator::new();
        let configs = vec![
            ValidatedConfig::Mechanics(MechanicsConfig::default()),
            ValidatedConfig::Visual(VisualConfig {
                ui_theme: UiTheme::Minimal,
                ..VisualConfig::default()
            }),
        ];
        let plan = [(Section::Visual, 0.6, 99)];
        let (out, record) =
            randomize_all(&validator, &configs, &plan, "2026-01-01T00:00:00").unwrap();

        assert_eq!(out[0], configs[0]);
        assert_eq!(out[1], randomize(&validator, &configs[1], 0.6, 99).unwrap());
        assert_eq!(record.seeds.visual, Some(99));
        assert_eq!(record.seeds.mechanics, None);
        assert_eq!(record.variation_amounts.visual, 0.6);
    }
}
