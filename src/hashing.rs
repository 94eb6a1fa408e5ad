//! Hashing - SHA-256 digests over canonical JSON
//!
//! A build is fingerprinted per section and as a whole, so two runs can be
//! compared, and the section that differs named, without diffing files.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::schema::{LevelsConfig, MechanicsConfig, VisualConfig};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// JSON with object keys sorted at every depth and no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut v = serde_json::to_value(value)?;
    sort_keys(&mut v);
    serde_json::to_string(&v)
}

fn sort_keys(v: &mut Value) {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, mut value) in entries {
                sort_keys(&mut value);
                map.insert(key, value);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Digest of one config section.
pub fn config_digest<T: Serialize>(config: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(config)?.as_bytes()))
}

/// Fingerprint of the configs a run was built from. Embedded images are
/// excluded, so replacing an asset does not change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDigest {
    pub mechanics: String,
    pub levels: String,
    pub visual: String,
    /// sha256 over the three section digests, in section order.
    pub combined: String,
}

impl BuildDigest {
    pub fn of(
        mechanics: &MechanicsConfig,
        levels: &LevelsConfig,
        visual: &VisualConfig,
    ) -> Result<Self, serde_json::Error> {
        let mechanics = config_digest(mechanics)?;
        let levels = config_digest(levels)?;
        let visual = config_digest(&visual.without_slot_images())?;
        let combined = sha256_hex(format!("{}\n{}\n{}", mechanics, levels, visual).as_bytes());
        Ok(Self {
            mechanics,
            levels,
            visual,
            combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetSlot;
    use serde_json::json;

    fn levels() -> LevelsConfig {
        serde_json::from_value(json!({"total_levels": 1, "levels": []})).unwrap()
    }

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": true, "b": [3, {"d": 0, "c": 1}]}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":{"b":[3,{"c":1,"d":0}],"y":true},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_build_digest_ignores_images() {
        let mechanics = MechanicsConfig::default();
        let plain = VisualConfig::default();
        let mut with_image = plain.clone();
        with_image.set_slot_image(AssetSlot::Felt, "iVBORw0KGgo=".to_string());

        let a = BuildDigest::of(&mechanics, &levels(), &plain).unwrap();
        let b = BuildDigest::of(&mechanics, &levels(), &with_image).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.combined.len(), 64);
    }

    #[test]
    fn test_build_digest_names_changed_section() {
        let mechanics = MechanicsConfig::default();
        let visual = VisualConfig::default();
        let mut darker = visual.clone();
        darker.background_color = "#000000".to_string();

        let a = BuildDigest::of(&mechanics, &levels(), &visual).unwrap();
        let b = BuildDigest::of(&mechanics, &levels(), &darker).unwrap();
        assert_eq!(a.mechanics, b.mechanics);
        assert_eq!(a.levels, b.levels);
        assert_ne!(a.visual, b.visual);
        assert_ne!(a.combined, b.combined);
    }
}
