//! Asset Store - canonical project images per slot
//!
//! The store exclusively owns `<slot>.png` under the project asset
//! directory. Every canonical file is exactly its slot's declared size.
//! Overwrites keep the previous version in the history directory.

use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use base64::Engine;
use chrono::Local;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::color::Rgb;
use crate::error::{CoreError, CoreResult};
use crate::hashing::sha256_hex;
use crate::layout::ProjectLayout;
use crate::schema::VisualConfig;

/// Placeholder colour when neither the visual config nor its defaults name one.
pub const FALLBACK_PLACEHOLDER: Rgb = Rgb::new(0x33, 0x33, 0x33);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSlot {
    Background,
    CardBack,
    Felt,
    SuitSpade,
    SuitHeart,
    SuitDiamond,
    SuitClub,
}

impl AssetSlot {
    pub const ALL: [AssetSlot; 7] = [
        AssetSlot::Background,
        AssetSlot::CardBack,
        AssetSlot::Felt,
        AssetSlot::SuitSpade,
        AssetSlot::SuitHeart,
        AssetSlot::SuitDiamond,
        AssetSlot::SuitClub,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AssetSlot::Background => "background",
            AssetSlot::CardBack => "card_back",
            AssetSlot::Felt => "felt",
            AssetSlot::SuitSpade => "suit_spade",
            AssetSlot::SuitHeart => "suit_heart",
            AssetSlot::SuitDiamond => "suit_diamond",
            AssetSlot::SuitClub => "suit_club",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AssetSlot::Background => "Full background image",
            AssetSlot::CardBack => "Card back face (face-down)",
            AssetSlot::Felt => "Table surface / felt texture",
            AssetSlot::SuitSpade => "Spade suit icon",
            AssetSlot::SuitHeart => "Heart suit icon",
            AssetSlot::SuitDiamond => "Diamond suit icon",
            AssetSlot::SuitClub => "Club suit icon",
        }
    }

    /// Canonical pixel dimensions `[width, height]`.
    pub fn size(&self) -> [u32; 2] {
        match self {
            AssetSlot::Background => [390, 844],
            AssetSlot::CardBack => [60, 84],
            AssetSlot::Felt => [366, 560],
            _ => [100, 100],
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self.name())
    }

    /// Name of the derived visual field carrying this slot's embedded image.
    pub fn image_field(&self) -> String {
        format!("{}_image", self.name())
    }
}

impl fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetSlot {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetSlot::ALL
            .into_iter()
            .find(|slot| slot.name() == s)
            .ok_or_else(|| CoreError::UnknownAssetSlot(s.to_string()))
    }
}

/// One row of [`AssetStore::list`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    pub name: String,
    pub description: String,
    pub size: [u32; 2],
    pub has_file: bool,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub preview_base64: Option<String>,
}

/// Outcome of [`AssetStore::write`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenAsset {
    pub slot: AssetSlot,
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
    pub resized_from: Option<[u32; 2]>,
}

pub struct AssetStore {
    assets_dir: PathBuf,
    history_dir: PathBuf,
    // Serializes backup-then-swap so two writers cannot lose a version.
    write_lock: Mutex<()>,
}

impl AssetStore {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            assets_dir: layout.assets_dir.clone(),
            history_dir: layout.history_dir.clone(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    pub fn slot_path(&self, slot: AssetSlot) -> PathBuf {
        self.assets_dir.join(slot.file_name())
    }

    /// Create a solid-colour PNG for every slot that has no file yet.
    ///
    /// Never overwrites an existing file. Returns the slots it created.
    pub fn ensure_placeholders(&self, visual: Option<&VisualConfig>) -> CoreResult<Vec<AssetSlot>> {
        fs::create_dir_all(&self.assets_dir)?;
        let mut created = vec![];

        for slot in AssetSlot::ALL {
            let dest = self.slot_path(slot);
            if dest.exists() {
                continue;
            }

            let color = placeholder_color(slot, visual);
            let [w, h] = slot.size();
            let img = RgbImage::from_pixel(w, h, image::Rgb([color.r, color.g, color.b]));
            let bytes = encode_png(&DynamicImage::ImageRgb8(img))?;

            let mut tmp = NamedTempFile::new_in(&self.assets_dir)?;
            tmp.write_all(&bytes)?;
            match tmp.persist_noclobber(&dest) {
                Ok(_) => {
                    tracing::info!(
                        slot = %slot,
                        width = w,
                        height = h,
                        color = %color,
                        "created placeholder asset"
                    );
                    created.push(slot);
                }
                // Another writer got there first; its file wins.
                Err(e) if dest.exists() => {
                    tracing::debug!(slot = %slot, error = %e.error, "placeholder already present");
                }
                Err(e) => return Err(e.error.into()),
            }
        }

        Ok(created)
    }

    pub fn read(&self, slot_name: &str) -> CoreResult<Option<Vec<u8>>> {
        let slot: AssetSlot = slot_name.parse()?;
        self.read_slot(slot)
    }

    pub fn read_slot(&self, slot: AssetSlot) -> CoreResult<Option<Vec<u8>>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    /// Store new image bytes for a slot, resampled to the slot's canonical size.
    ///
    /// The previous file, if any, is copied to the history directory before
    /// the new file is renamed over it.
    pub fn write(&self, slot_name: &str, bytes: &[u8]) -> CoreResult<WrittenAsset> {
        let slot: AssetSlot = slot_name.parse()?;
        let (png, resized_from) = fit_to_size(bytes, slot.size())?;

        fs::create_dir_all(&self.assets_dir)?;
        fs::create_dir_all(&self.history_dir)?;

        let mut tmp = NamedTempFile::new_in(&self.assets_dir)?;
        tmp.write_all(&png)?;
        tmp.flush()?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let dest = self.slot_path(slot);
        let backup = if dest.exists() {
            let backup = self.backup_path(slot);
            fs::copy(&dest, &backup)?;
            tracing::info!(slot = %slot, backup = %backup.display(), "backed up asset");
            Some(backup)
        } else {
            None
        };
        tmp.persist(&dest).map_err(|e| e.error)?;

        let [w, h] = slot.size();
        tracing::info!(slot = %slot, width = w, height = h, ?resized_from, "saved project asset");

        Ok(WrittenAsset {
            slot,
            path: dest,
            backup,
            resized_from,
        })
    }

    /// Every slot with its current file state.
    pub fn list(&self) -> CoreResult<Vec<AssetInfo>> {
        let engine = base64::engine::general_purpose::STANDARD;
        let mut assets = vec![];
        for slot in AssetSlot::ALL {
            let bytes = self.read_slot(slot)?;
            assets.push(AssetInfo {
                name: slot.name().to_string(),
                description: slot.description().to_string(),
                size: slot.size(),
                has_file: bytes.is_some(),
                sha256: bytes.as_deref().map(sha256_hex),
                preview_base64: bytes.as_deref().map(|b| engine.encode(b)),
            });
        }
        tracing::debug!(count = assets.len(), "listed asset slots");
        Ok(assets)
    }

    /// `<slot>_<YYYYMMDD_HHMMSS_mmm>.png`, suffixed when that name is taken.
    fn backup_path(&self, slot: AssetSlot) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let mut path = self.history_dir.join(format!("{}_{}.png", slot.name(), stamp));
        let mut n = 1;
        while path.exists() {
            path = self.history_dir.join(format!("{}_{}_{}.png", slot.name(), stamp, n));
            n += 1;
        }
        path
    }
}

fn placeholder_color(slot: AssetSlot, visual: Option<&VisualConfig>) -> Rgb {
    let defaults = VisualConfig::default();
    visual
        .and_then(|v| v.placeholder_color(slot))
        .and_then(|c| c.parse::<Rgb>().ok())
        .or_else(|| defaults.placeholder_color(slot).and_then(|c| c.parse().ok()))
        .unwrap_or(FALLBACK_PLACEHOLDER)
}

/// Decode any supported raster and re-encode it as PNG at exactly `size`.
///
/// Returns the original dimensions when a resample was needed.
pub fn fit_to_size(bytes: &[u8], size: [u32; 2]) -> CoreResult<(Vec<u8>, Option<[u32; 2]>)> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| CoreError::InvalidImageData(e.to_string()))?;
    let original = [img.width(), img.height()];
    let [w, h] = size;

    let (img, resized_from) = if original != size {
        tracing::debug!(from = ?original, to = ?size, "resampling image");
        (img.resize_exact(w, h, FilterType::Lanczos3), Some(original))
    } else {
        (img, None)
    };

    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    Ok((encode_png(&rgba)?, resized_from))
}

fn encode_png(img: &DynamicImage) -> CoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CoreError::InvalidImageData(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb(rgb)))).unwrap()
    }

    fn store() -> (tempfile::TempDir, AssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let store = AssetStore::new(&layout);
        (dir, store)
    }

    #[test]
    fn test_slot_catalog() {
        assert_eq!(AssetSlot::ALL.len(), 7);
        assert_eq!(AssetSlot::Felt.size(), [366, 560]);
        assert_eq!(AssetSlot::CardBack.image_field(), "card_back_image");
        assert_eq!("suit_club".parse::<AssetSlot>().unwrap(), AssetSlot::SuitClub);
        assert!(matches!("joker".parse::<AssetSlot>(), Err(CoreError::UnknownAssetSlot(_))));
    }

    #[test]
    fn test_placeholders_use_visual_colors() {
        let (_dir, store) = store();
        let visual = VisualConfig {
            card_back_color: "#ff0000".to_string(),
            background_color: "not-a-colour".to_string(),
            ..VisualConfig::default()
        };

        let created = store.ensure_placeholders(Some(&visual)).unwrap();
        assert_eq!(created.len(), 7);

        let card_back = image::open(store.slot_path(AssetSlot::CardBack)).unwrap().to_rgb8();
        assert_eq!(card_back.dimensions(), (60, 84));
        assert_eq!(card_back.get_pixel(0, 0).0, [255, 0, 0]);

        // Unparseable colour falls back to the default background colour.
        let bg = image::open(store.slot_path(AssetSlot::Background)).unwrap().to_rgb8();
        assert_eq!(bg.get_pixel(10, 10).0, [0x1a, 0x47, 0x2a]);

        let spade = image::open(store.slot_path(AssetSlot::SuitSpade)).unwrap().to_rgb8();
        assert_eq!(spade.get_pixel(0, 0).0, [0x33, 0x33, 0x33]);
    }

    #[test]
    fn test_placeholders_idempotent() {
        let (_dir, store) = store();
        store.ensure_placeholders(None).unwrap();
        let before = store.read("felt").unwrap().unwrap();

        let other = VisualConfig {
            table_felt_color: "#0000ff".to_string(),
            ..VisualConfig::default()
        };
        let created = store.ensure_placeholders(Some(&other)).unwrap();
        assert!(created.is_empty());
        assert_eq!(store.read("felt").unwrap().unwrap(), before);
    }

    #[test]
    fn test_write_resizes_and_backs_up() {
        let (_dir, store) = store();
        let first = store.write("card_back", &png(120, 168, [0, 0, 255])).unwrap();
        assert_eq!(first.resized_from, Some([120, 168]));
        assert!(first.backup.is_none());

        let stored = image::load_from_memory(&store.read("card_back").unwrap().unwrap()).unwrap();
        assert_eq!((stored.width(), stored.height()), (60, 84));

        let second = store.write("card_back", &png(60, 84, [0, 255, 0])).unwrap();
        assert_eq!(second.resized_from, None);
        let backup = second.backup.expect("previous version backed up");
        assert!(backup.starts_with(store.history_dir()));
        assert!(backup.file_name().unwrap().to_string_lossy().starts_with("card_back_"));

        let old = image::open(&backup).unwrap().to_rgb8();
        assert_eq!(old.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_backups_never_collide() {
        let (_dir, store) = store();
        for shade in [10u8, 20, 30, 40] {
            store.write("suit_heart", &png(100, 100, [shade, 0, 0])).unwrap();
        }
        let backups = fs::read_dir(store.history_dir()).unwrap().count();
        assert_eq!(backups, 3);
    }

    #[test]
    fn test_write_rejects_bad_input() {
        let (_dir, store) = store();
        assert!(matches!(
            store.write("joker", &png(1, 1, [0, 0, 0])),
            Err(CoreError::UnknownAssetSlot(_))
        ));
        assert!(matches!(
            store.write("felt", b"not an image"),
            Err(CoreError::InvalidImageData(_))
        ));
        assert!(!store.slot_path(AssetSlot::Felt).exists());
    }

    #[test]
    fn test_list_reports_presence() {
        let (_dir, store) = store();
        store.write("background", &png(390, 844, [1, 2, 3])).unwrap();
        let assets = store.list().unwrap();
        let bg = assets.iter().find(|a| a.name == "background").unwrap();
        assert!(bg.has_file);
        assert_eq!(bg.sha256.as_ref().map(|h| h.len()), Some(64));
        let felt = assets.iter().find(|a| a.name == "felt").unwrap();
        assert!(!felt.has_file && felt.preview_base64.is_none());
    }
}
