use crate::drag::DragSettings;
use crate::orbit::OrbitSettings;
use anyhow::{Context, Result};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_PATH: &str = "tabletop.json";

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabletopConfig {
    pub orbit: OrbitSettings,
    pub drag: DragSettings,
    pub controls: ControlSettings,
    pub scenes: BTreeMap<String, SceneEntry>,
    pub initial_scene: Option<String>,
}

impl Default for TabletopConfig {
    fn default() -> Self {
        let mut scenes = BTreeMap::new();
        scenes.insert("Tabletop".to_owned(), SceneEntry::default());
        Self {
            orbit: OrbitSettings::default(),
            drag: DragSettings::default(),
            controls: ControlSettings::default(),
            scenes,
            initial_scene: Some("Tabletop".to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub rotate_left: KeyCode,
    pub rotate_right: KeyCode,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            rotate_left: KeyCode::KeyQ,
            rotate_right: KeyCode::KeyE,
        }
    }
}

/// Assets spawned alongside the procedural table when a scene activates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneEntry {
    /// `Scene` asset paths, e.g. `models/board.glb#Scene0`.
    pub assets: Vec<String>,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<TabletopConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(path: impl AsRef<Path>, config: &TabletopConfig) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(config).context("serializing config")?;
    fs::write(path, text).with_context(|| format!("writing config {}", path.display()))
}

/// Missing files silently yield defaults; broken ones are logged first.
pub fn load_or_default(path: impl AsRef<Path>) -> TabletopConfig {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No config file, using defaults");
        return TabletopConfig::default();
    }
    match load_config(path) {
        Ok(config) => {
            info!(path = %path.display(), scenes = config.scenes.len(), "Loaded config");
            config
        }
        Err(err) => {
            warn!("{err:#}; falling back to default config");
            TabletopConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::ReleaseMode;
    use crate::easing::TransitionCurve;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_PATH);

        let mut config = TabletopConfig::default();
        config.orbit.step_degrees = 30.0;
        config.orbit.curve = TransitionCurve::Keyframes(vec![[0.0, 0.0], [1.0, 1.0]]);
        config.drag.release = ReleaseMode::Drop;
        config.controls.rotate_left = KeyCode::ArrowLeft;
        config.scenes.insert(
            "Cellar".to_owned(),
            SceneEntry {
                assets: vec!["models/cellar.glb#Scene0".to_owned()],
            },
        );

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        fs::write(&path, r#"{ "orbit": { "step_degrees": 90.0 } }"#).unwrap();

        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.orbit.step_degrees, 90.0);
        assert_eq!(loaded.orbit.duration_secs, OrbitSettings::default().duration_secs);
        assert_eq!(loaded.drag, DragSettings::default());
        assert_eq!(loaded.controls, ControlSettings::default());
    }

    #[test]
    fn missing_file_is_an_error_with_path_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let err = load_config(&path).unwrap_err();

        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        fs::write(&path, "{ not json").unwrap();

        assert!(load_config(&path).is_err());
        assert_eq!(load_or_default(&path), TabletopConfig::default());
    }

    #[test]
    fn default_config_starts_on_a_known_scene() {
        let config = TabletopConfig::default();
        let initial = config.initial_scene.as_deref().expect("initial scene");
        assert!(config.scenes.contains_key(initial));
    }
}
