use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration stored in JSON.
///
/// The legacy on-disk form carried a single `targetScreenIndex`; it is
/// upgraded to the set form by [`migrate`] on load and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub target_screen_indices: BTreeSet<usize>,
    pub inactivity_timeout_seconds: u64,
    pub start_with_windows: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_screen_indices: BTreeSet::from([1]),
            inactivity_timeout_seconds: DEFAULT_TIMEOUT_SECS,
            start_with_windows: false,
        }
    }
}

/// Raw on-disk shape, tolerant of both the current and the legacy layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredConfig {
    pub target_screen_indices: Option<BTreeSet<usize>>,
    pub target_screen_index: Option<usize>,
    pub inactivity_timeout_seconds: Option<u64>,
    pub start_with_windows: Option<bool>,
}

/// Upgrade a raw on-disk record to the current form.
///
/// Returns the resolved config and whether the stored file needs rewriting
/// (legacy field present, or an out-of-range timeout was clamped). Pure so
/// it can be tested without file I/O; idempotent by construction since the
/// output form has no legacy field left to migrate.
pub fn migrate(stored: StoredConfig) -> (AppConfig, bool) {
    let defaults = AppConfig::default();
    let mut changed = false;

    let target_screen_indices = match (stored.target_screen_indices, stored.target_screen_index) {
        (Some(set), legacy) => {
            changed |= legacy.is_some();
            set
        }
        (None, Some(index)) => {
            changed = true;
            BTreeSet::from([index])
        }
        (None, None) => defaults.target_screen_indices,
    };

    let raw_timeout = stored
        .inactivity_timeout_seconds
        .unwrap_or(defaults.inactivity_timeout_seconds);
    let inactivity_timeout_seconds = raw_timeout.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
    changed |= inactivity_timeout_seconds != raw_timeout;

    let cfg = AppConfig {
        target_screen_indices,
        inactivity_timeout_seconds,
        start_with_windows: stored.start_with_windows.unwrap_or(defaults.start_with_windows),
    };
    (cfg, changed)
}

/// Intersect the configured targets with the monitors actually present and
/// drop the primary monitor's index. Returns whether anything was removed.
///
/// The primary monitor hosts the tray and must stay reachable, so it is
/// never a valid blackout target.
pub fn sanitize_targets(
    cfg: &mut AppConfig,
    primary: Option<usize>,
    present: &BTreeSet<usize>,
) -> bool {
    let before = cfg.target_screen_indices.len();
    cfg.target_screen_indices
        .retain(|i| present.contains(i) && Some(*i) != primary);
    cfg.target_screen_indices.len() != before
}

pub fn config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("IdleShade").join("config.json")
}

pub fn load_from(path: &Path) -> AppConfig {
    // Passive load: a missing or corrupt file yields defaults, never an error.
    let stored: StoredConfig = match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!("config file unreadable, using defaults: {e}");
            StoredConfig::default()
        }),
        Err(_) => StoredConfig::default(),
    };

    let (cfg, changed) = migrate(stored);
    if changed {
        // One-time upgrade: persist immediately so the legacy field is gone.
        if let Err(e) = save_to(path, &cfg) {
            warn!("could not persist migrated config: {e:#}");
        }
    }
    cfg
}

pub fn save_to(path: &Path, cfg: &AppConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(cfg).context("serializing config")?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

pub fn load_config() -> AppConfig {
    load_from(&config_path())
}

pub fn save_config(cfg: &AppConfig) -> anyhow::Result<()> {
    save_to(&config_path(), cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(json: &str) -> StoredConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn legacy_single_index_migrates_to_set() {
        let (cfg, changed) = migrate(stored(r#"{"targetScreenIndex": 2}"#));
        assert!(changed);
        assert_eq!(cfg.target_screen_indices, BTreeSet::from([2]));
    }

    #[test]
    fn migrated_config_serializes_without_legacy_field() {
        let (cfg, _) = migrate(stored(r#"{"targetScreenIndex": 2}"#));
        let value = serde_json::to_value(&cfg).unwrap();
        assert!(value.get("targetScreenIndex").is_none());
        assert_eq!(value["targetScreenIndices"], serde_json::json!([2]));
    }

    #[test]
    fn set_form_wins_over_stale_legacy_field() {
        let (cfg, changed) =
            migrate(stored(r#"{"targetScreenIndices": [1, 3], "targetScreenIndex": 2}"#));
        // Legacy field is dropped, but its presence still forces a rewrite.
        assert!(changed);
        assert_eq!(cfg.target_screen_indices, BTreeSet::from([1, 3]));
    }

    #[test]
    fn migration_is_idempotent() {
        let (first, _) = migrate(stored(r#"{"targetScreenIndex": 2}"#));
        let json = serde_json::to_string(&first).unwrap();
        let (second, changed) = migrate(stored(&json));
        assert!(!changed);
        assert_eq!(first, second);
    }

    #[test]
    fn timeout_is_clamped_into_range() {
        let (cfg, changed) = migrate(stored(r#"{"inactivityTimeoutSeconds": 0}"#));
        assert!(changed);
        assert_eq!(cfg.inactivity_timeout_seconds, MIN_TIMEOUT_SECS);

        let (cfg, changed) = migrate(stored(r#"{"inactivityTimeoutSeconds": 9000}"#));
        assert!(changed);
        assert_eq!(cfg.inactivity_timeout_seconds, MAX_TIMEOUT_SECS);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (cfg, changed) = migrate(stored("{}"));
        assert!(!changed);
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn sanitize_removes_primary_and_absent_indices() {
        let mut cfg = AppConfig {
            target_screen_indices: BTreeSet::from([0, 1, 2, 5]),
            ..AppConfig::default()
        };
        let present = BTreeSet::from([0, 1, 2]);
        let changed = sanitize_targets(&mut cfg, Some(0), &present);
        assert!(changed);
        assert_eq!(cfg.target_screen_indices, BTreeSet::from([1, 2]));

        // Already valid: no change reported.
        let changed = sanitize_targets(&mut cfg, Some(0), &present);
        assert!(!changed);
    }

    #[test]
    fn corrupt_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json at all {{{").unwrap();
        assert_eq!(load_from(&path), AppConfig::default());
    }

    #[test]
    fn legacy_file_is_rewritten_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"targetScreenIndex": 2, "inactivityTimeoutSeconds": 45}"#).unwrap();

        let cfg = load_from(&path);
        assert_eq!(cfg.target_screen_indices, BTreeSet::from([2]));
        assert_eq!(cfg.inactivity_timeout_seconds, 45);

        // The rewritten file has no legacy field and re-loads unchanged.
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("targetScreenIndex\""));
        assert_eq!(load_from(&path), cfg);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = AppConfig {
            target_screen_indices: BTreeSet::from([1, 2]),
            inactivity_timeout_seconds: 120,
            start_with_windows: true,
        };
        save_to(&path, &cfg).unwrap();
        assert_eq!(load_from(&path), cfg);
    }
}
