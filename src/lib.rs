//! Playable Core - configuration engine for playable-ad solitaire builds
//!
//! # Ground Rules
//! 1. Three Sections, One Validator
//! 2. Seeds Reproduce Variants
//! 3. Slots Are Fixed, Sizes Are Canonical
//! 4. Builds Are Atomic and Immutable
//! 5. Generators Suggest, Validator Enforces

pub mod assets;
pub mod builder;
pub mod collaborators;
pub mod color;
pub mod error;
pub mod hashing;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod randomize;
pub mod registry;
pub mod schema;
pub mod templates;
pub mod validation;

pub use assets::{AssetInfo, AssetSlot, AssetStore, WrittenAsset};
pub use builder::{AppliedRequests, BuildRequest, PendingRequest, RunHandle};
pub use collaborators::{ContentGenerator, ImageGenerator, Instruction};
pub use error::{CoreError, CoreResult, FieldViolation, ValidationError};
pub use hashing::{canonical_json, config_digest, sha256_hex, BuildDigest};
pub use layout::{DefaultConfigs, ProjectLayout};
pub use pipeline::{GeneratedLevel, Pipeline, RawBuild, Randomized};
pub use registry::{RunContents, RunRegistry, RunSummary};
pub use schema::{
    LevelsConfig, MechanicsConfig, Section, SeedConfig, ValidatedConfig, VisualConfig,
};
pub use validation::{validate_seed, Validator};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
