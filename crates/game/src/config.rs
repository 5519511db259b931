//! Game configuration (window, logical resolution, flight model, smoke). Loaded from
//! config.ron at startup.

use physics::{FlightModelKind, ParticleSystemConfig};
use renderer::{TextEffect, DEFAULT_LOD_BIAS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Internal render resolution; the output is scaled up from this.
    #[serde(default = "default_logical_width")]
    pub logical_width: u32,
    #[serde(default = "default_logical_height")]
    pub logical_height: u32,
    /// Frame cap; 0 runs uncapped.
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    #[serde(default = "default_lod_bias")]
    pub lod_bias: i32,
    #[serde(default)]
    pub flight_model: FlightModelKind,
    /// Start at night.
    #[serde(default)]
    pub night: bool,
    /// Rear-view mirror strip at the top of the screen.
    #[serde(default = "default_true")]
    pub show_mirror: bool,
    #[serde(default = "default_smoke")]
    pub smoke: ParticleSystemConfig,
    /// How HUD text stands off the scene behind it.
    #[serde(default)]
    pub hud_text_effect: TextEffect,
    /// Scenery layout and particle seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    800
}
fn default_logical_width() -> u32 {
    320
}
fn default_logical_height() -> u32 {
    200
}
fn default_target_fps() -> u32 {
    60
}
fn default_lod_bias() -> i32 {
    DEFAULT_LOD_BIAS
}
fn default_true() -> bool {
    true
}
fn default_seed() -> u64 {
    0x5EED_F11E
}

/// Exhaust smoke: short-lived, sparse, growing puffs.
fn default_smoke() -> ParticleSystemConfig {
    ParticleSystemConfig {
        max_particles: 120,
        respawn: true,
        spawn_rate_per_second: 30.0,
        life: (1.5, 3.0),
        size_start: (0.4, 0.8),
        size_end: (3.0, 5.0),
        ..ParticleSystemConfig::default()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            logical_width: default_logical_width(),
            logical_height: default_logical_height(),
            target_fps: default_target_fps(),
            lod_bias: default_lod_bias(),
            flight_model: FlightModelKind::default(),
            night: false,
            show_mirror: default_true(),
            smoke: default_smoke(),
            hud_text_effect: TextEffect::default(),
            seed: default_seed(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`, writing the defaults there first if the file is missing.
    pub fn load_or_create() -> Self {
        Self::load_or_create_at(&config_path())
    }

    pub fn load_or_create_at(path: &Path) -> Self {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        config.save_to(path);
        log::info!("Wrote default config to {:?}", path);
        config
    }

    /// If the file is unreadable or invalid, returns default config.
    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Logs on error.
    pub fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: GameConfig = ron::from_str("(logical_width: 640, flight_model: debug)").expect("parse");
        assert_eq!(config.logical_width, 640);
        assert_eq!(config.logical_height, 200);
        assert_eq!(config.flight_model, FlightModelKind::Debug);
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.smoke, default_smoke());
    }

    #[test]
    fn survives_a_ron_round_trip() {
        let config = GameConfig {
            night: true,
            seed: 7,
            ..GameConfig::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).expect("serialize");
        let back: GameConfig = ron::from_str(&text).expect("parse");
        assert_eq!(back, config);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = std::env::temp_dir().join(format!("retroflight-new-{}.ron", std::process::id()));
        let _ = std::fs::remove_file(&path);
        assert_eq!(GameConfig::load_or_create_at(&path), GameConfig::default());
        assert!(path.exists());

        // An existing file is read, not overwritten.
        let custom = GameConfig {
            hud_text_effect: TextEffect::Outline,
            ..GameConfig::default()
        };
        custom.save_to(&path);
        assert_eq!(GameConfig::load_or_create_at(&path), custom);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("retroflight-config-{}.ron", std::process::id()));
        std::fs::write(&path, "(window_width: \"wide\")").expect("write");
        assert_eq!(GameConfig::load_from(&path), GameConfig::default());
        let _ = std::fs::remove_file(&path);
    }
}
