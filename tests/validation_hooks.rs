//! Every path into the builder counts as a validator call.
//!
//! Run with `--features test-hooks`. Kept in its own test binary so no
//! other test touches the global counter.

#![cfg(feature = "test-hooks")]

use std::fs;

use playable_core::validation::{get_validation_call_count, reset_validation_call_count};
use playable_core::{
    BuildRequest, MechanicsConfig, Pipeline, ProjectLayout, RawBuild, Section, VisualConfig,
};
use serde_json::json;

#[test]
fn build_and_randomize_go_through_validator() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    layout.ensure_dirs().unwrap();
    fs::write(layout.template_path(), "<script>__GAME_CONFIG__</script>").unwrap();
    let pipeline = Pipeline::new(layout);

    reset_validation_call_count();
    let raw = RawBuild {
        mechanics: json!({}),
        levels: json!({"total_levels": 1, "levels": []}),
        visual: json!({}),
        ..RawBuild::default()
    };
    pipeline.build(&raw).unwrap();
    assert_eq!(get_validation_call_count(), 3);

    reset_validation_call_count();
    let request = BuildRequest::new(
        MechanicsConfig::default(),
        serde_json::from_value(json!({"total_levels": 1, "levels": []})).unwrap(),
        VisualConfig::default(),
    );
    pipeline.build_validated(&request).unwrap();
    assert_eq!(get_validation_call_count(), 3);

    reset_validation_call_count();
    pipeline.randomize(Section::Mechanics, &json!({}), 0.5, Some(9)).unwrap();
    // Once on input, once on the randomized output
    assert_eq!(get_validation_call_count(), 2);
}
