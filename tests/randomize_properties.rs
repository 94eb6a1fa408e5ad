use playable_core::color::Rgb;
use playable_core::randomize::{randomize, randomize_all, vary_color, vary_int};
use playable_core::schema::{IntRange, CELL_WIDTH_RANGE, FLIP_DURATION_RANGE};
use playable_core::{Section, ValidatedConfig, Validator};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

fn sections(validator: &Validator) -> Vec<ValidatedConfig> {
    let levels = json!({
        "total_levels": 1,
        "levels": [{
            "level_id": 1,
            "enter_animation": "drop_down",
            "layout": {
                "foundation_card": "AS",
                "tableau": [{"code": "2H", "col": 0, "row": 0}],
                "grid": {"cell_width": 110, "cell_height": 76}
            }
        }]
    });
    vec![
        validator.validate(Section::Mechanics, &json!({})).unwrap(),
        validator.validate(Section::Levels, &levels).unwrap(),
        validator
            .validate(Section::Visual, &json!({"card_back_color": "#1a237e", "font_size_px": 48}))
            .unwrap(),
    ]
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

proptest! {
    #[test]
    fn randomize_is_deterministic(seed in any::<u64>(), variation in 0.0f64..=1.0) {
        let validator = Validator::new();
        for config in sections(&validator) {
            let a = randomize(&validator, &config, variation, seed).unwrap();
            let b = randomize(&validator, &config, variation, seed).unwrap();
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn randomize_keeps_configs_valid(seed in any::<u64>(), variation in 0.0f64..=1.0) {
        let validator = Validator::new();
        for config in sections(&validator) {
            let randomized = randomize(&validator, &config, variation, seed).unwrap();
            prop_assert_eq!(randomized.section(), config.section());

            match (&config, &randomized) {
                (ValidatedConfig::Levels(before), ValidatedConfig::Levels(after)) => {
                    // Card layout is never varied
                    let (before, after) = (&before.levels[0].layout, &after.levels[0].layout);
                    prop_assert_eq!(&before.tableau, &after.tableau);
                    prop_assert_eq!(&before.foundation_card, &after.foundation_card);
                }
                (ValidatedConfig::Visual(_), ValidatedConfig::Visual(after)) => {
                    prop_assert!(is_hex_color(&after.card_back_color), "{}", after.card_back_color);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn zero_variation_is_identity(seed in any::<u64>()) {
        let validator = Validator::new();
        for config in sections(&validator) {
            let randomized = randomize(&validator, &config, 0.0, seed).unwrap();
            prop_assert_eq!(randomized, config);
        }
    }

    #[test]
    fn vary_int_stays_in_bounds(
        seed in any::<u64>(),
        current in 56u32..=110,
        variation in 0.0f64..=1.0,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let varied = vary_int(&mut rng, current, CELL_WIDTH_RANGE, variation);
        let delta = (54.0 * variation).floor() as i64;
        prop_assert!(CELL_WIDTH_RANGE.contains(varied as i64));
        prop_assert!((varied as i64 - current as i64).abs() <= delta);
    }

    #[test]
    fn vary_int_clamps_at_edges(seed in any::<u64>()) {
        let range: IntRange = FLIP_DURATION_RANGE;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        prop_assert!(vary_int(&mut rng, range.max, range, 1.0) <= range.max);
        prop_assert!(vary_int(&mut rng, range.min, range, 1.0) >= range.min);
    }

    #[test]
    fn vary_color_emits_hex(
        seed in any::<u64>(),
        r in any::<u8>(),
        g in any::<u8>(),
        b in any::<u8>(),
        variation in 0.01f64..=1.0,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let input = format!("#{:02x}{:02x}{:02x}", r, g, b);
        let varied = vary_color(&mut rng, &input, variation);
        prop_assert!(is_hex_color(&varied), "{}", varied);
    }
}

// Output is rounded to 8-bit channels, which can move each decoded HSL
// component slightly past the nominal spread.
const CHANNEL_ROUNDING: f64 = 0.01;

#[test]
fn color_jitter_within_hsl_spread() {
    let original: Rgb = "#1a237e".parse().unwrap();
    let before = original.to_hsl();

    for seed in 0..2000 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let varied: Rgb = vary_color(&mut rng, "#1a237e", 1.0).parse().unwrap();
        let after = varied.to_hsl();

        let dh = (after.h - before.h).abs();
        let dh = dh.min(1.0 - dh);
        assert!(dh <= 0.3 + CHANNEL_ROUNDING, "seed {}: hue moved {}", seed, dh);
        assert!(
            (after.s - before.s).abs() <= 0.2 + CHANNEL_ROUNDING,
            "seed {}: saturation moved {}",
            seed,
            after.s - before.s
        );
        assert!(
            (after.l - before.l).abs() <= 0.15 + CHANNEL_ROUNDING,
            "seed {}: lightness moved {}",
            seed,
            after.l - before.l
        );
    }
}

#[test]
fn color_jitter_reproducible() {
    let first = vary_color(&mut ChaCha8Rng::seed_from_u64(42), "#1a237e", 1.0);
    let second = vary_color(&mut ChaCha8Rng::seed_from_u64(42), "#1a237e", 1.0);
    assert_eq!(first, second);
    assert_eq!(first, "#4e0b81");
}

#[test]
fn unparseable_color_unchanged() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    assert_eq!(vary_color(&mut rng, "rebeccapurple", 1.0), "rebeccapurple");
}

#[test]
fn randomize_all_records_seeds() {
    let validator = Validator::new();
    let configs = sections(&validator);
    let plan = [(Section::Visual, 0.3, 42), (Section::Levels, 0.5, 7)];

    let (out, record) = randomize_all(&validator, &configs, &plan, "2026-01-01T00:00:00").unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out[0], configs[0]);
    assert_eq!(record.seeds.visual, Some(42));
    assert_eq!(record.seeds.levels, Some(7));
    assert_eq!(record.seeds.mechanics, None);
    assert_eq!(record.variation_amounts.levels, 0.5);
    assert_eq!(record.created_at, "2026-01-01T00:00:00");
}
