//! Run Builder - one immutable, self-contained artifact per build
//!
//! Everything is written into a hidden staging directory inside the runs
//! directory and renamed into place only once the whole run is complete,
//! so a failed build never leaves a partial run behind.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assets::{AssetSlot, AssetStore};
use crate::error::{CoreError, CoreResult};
use crate::hashing::BuildDigest;
use crate::layout::{write_json, ProjectLayout};
use crate::schema::{LevelsConfig, MechanicsConfig, SeedConfig, VisualConfig};
use crate::templates::BuildTemplate;

pub const RUN_PREFIX: &str = "build_";
pub const INDEX_FILE: &str = "index.html";
pub const SEED_FILE: &str = "seed.json";
pub const APPLIED_REQUESTS_FILE: &str = "applied_requests.json";
pub const RUN_ASSETS_DIR: &str = "assets";

const STAGING_PREFIX: &str = ".staging-";

/// One change request an operator queued before a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub category: String,
    #[serde(default)]
    pub level_number: Option<u32>,
    pub reasoning: String,
    pub complexity: String,
}

/// Log of the requests applied to the configs of a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRequests {
    pub requests: Vec<PendingRequest>,
    pub changes_summary: String,
    #[serde(default)]
    pub skipped_requests: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub mechanics: MechanicsConfig,
    pub levels: LevelsConfig,
    pub visual: VisualConfig,
    pub seed: Option<SeedConfig>,
    pub applied: Option<AppliedRequests>,
}

impl BuildRequest {
    pub fn new(mechanics: MechanicsConfig, levels: LevelsConfig, visual: VisualConfig) -> Self {
        Self {
            mechanics,
            levels,
            visual,
            seed: None,
            applied: None,
        }
    }

    pub fn with_seed(mut self, seed: SeedConfig) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_applied(mut self, applied: AppliedRequests) -> Self {
        self.applied = Some(applied);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: String,
    pub play_path: String,
    /// Per-section and combined sha256 of the persisted configs.
    pub config_digest: BuildDigest,
    pub embedded_assets: Vec<AssetSlot>,
}

/// The combined document injected into `index.html`.
#[derive(Serialize)]
struct GameDocument<'a> {
    mechanics: &'a MechanicsConfig,
    levels: &'a LevelsConfig,
    visual: &'a VisualConfig,
}

pub(crate) struct RunBuilder {
    runs_dir: PathBuf,
    template_path: PathBuf,
}

impl RunBuilder {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            runs_dir: layout.runs_dir.clone(),
            template_path: layout.template_path(),
        }
    }

    /// Callers go through [`crate::Pipeline`], which validates every section first.
    pub(crate) fn build(
        &self,
        assets: &AssetStore,
        request: &BuildRequest,
    ) -> CoreResult<RunHandle> {
        let template = BuildTemplate::load(&self.template_path)?;
        let run_id = new_run_id(Local::now());
        tracing::info!(run_id = %run_id, "building run");

        fs::create_dir_all(&self.runs_dir)
            .map_err(|e| CoreError::build_failed("creating runs directory", e))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.runs_dir)
            .map_err(|e| CoreError::build_failed("creating staging directory", e))?;

        let persisted_visual = request.visual.without_slot_images();
        let dir = staging.path();
        persist(dir, "mechanics.json", &request.mechanics)?;
        persist(dir, "levels.json", &request.levels)?;
        persist(dir, "visual.json", &persisted_visual)?;
        if let Some(seed) = &request.seed {
            persist(dir, SEED_FILE, seed)?;
        }
        if let Some(applied) = &request.applied {
            persist(dir, APPLIED_REQUESTS_FILE, applied)?;
        }

        let (embedded_visual, embedded_assets) = embed_assets(assets, &persisted_visual, dir)?;
        if !embedded_assets.is_empty() {
            tracing::info!(run_id = %run_id, assets = ?embedded_assets, "embedded project assets");
        }

        let document = serde_json::to_string(&GameDocument {
            mechanics: &request.mechanics,
            levels: &request.levels,
            visual: &embedded_visual,
        })
        .map_err(|e| CoreError::build_failed("encoding game document", e))?;
        let html = template.render(&document)?;
        fs::write(dir.join(INDEX_FILE), html)
            .map_err(|e| CoreError::build_failed("writing index.html", e))?;

        let digest = BuildDigest::of(&request.mechanics, &request.levels, &persisted_visual)
            .map_err(|e| CoreError::build_failed("hashing configs", e))?;

        let run_dir = self.runs_dir.join(&run_id);
        fs::rename(dir, &run_dir)
            .map_err(|e| CoreError::build_failed(format!("publishing run {}", run_id), e))?;
        // The staging path no longer exists, so dropping the guard removes nothing.
        drop(staging);

        tracing::info!(run_id = %run_id, digest = %digest.combined, "build complete");
        Ok(RunHandle {
            play_path: format!("runs/{}/play", run_id),
            run_id,
            config_digest: digest,
            embedded_assets,
        })
    }
}

/// `build_YYYYMMDD_HHMMSS_mmm_xxxxxx`: sortable by time, unique within a millisecond.
pub fn new_run_id(now: DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}_{}", RUN_PREFIX, now.format("%Y%m%d_%H%M%S_%3f"), &suffix[..6])
}

pub(crate) fn is_staging_name(name: &str) -> bool {
    name.starts_with('.')
}

fn persist<T: Serialize>(dir: &Path, file: &str, value: &T) -> CoreResult<()> {
    write_json(&dir.join(file), value)
        .map_err(|e| CoreError::build_failed(format!("writing {}", file), e))
}

/// Inline every existing slot image into a copy of the visual config and
/// duplicate the raw file under the run's `assets/`.
fn embed_assets(
    assets: &AssetStore,
    visual: &VisualConfig,
    run_dir: &Path,
) -> CoreResult<(VisualConfig, Vec<AssetSlot>)> {
    let engine = base64::engine::general_purpose::STANDARD;
    let mut embedded = visual.clone();
    let mut slots = vec![];

    for slot in AssetSlot::ALL {
        let bytes = assets
            .read_slot(slot)
            .map_err(|e| CoreError::build_failed(format!("reading asset {}", slot), e))?;
        let Some(bytes) = bytes else {
            continue;
        };

        embedded.set_slot_image(slot, engine.encode(&bytes));

        let assets_dir = run_dir.join(RUN_ASSETS_DIR);
        fs::create_dir_all(&assets_dir)
            .and_then(|_| fs::write(assets_dir.join(slot.file_name()), &bytes))
            .map_err(|e| CoreError::build_failed(format!("copying asset {}", slot), e))?;
        slots.push(slot);
    }

    Ok((embedded, slots))
}
