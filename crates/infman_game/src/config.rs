//! Gameplay tunables.
//!
//! Every field has a built-in default, so `assets/config/game.json` may name
//! only the values it wants to override, or be absent entirely.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Logical screen size. The window and every screen-space layout use it.
pub const SCREEN_WIDTH: f32 = 1200.0;
pub const SCREEN_HEIGHT: f32 = 600.0;

/// World pixels per map cell.
pub const BLOCK_SIZE: f32 = 16.0;

pub const MAX_ENEMIES: usize = 1000;
pub const MAX_PROJECTILES: usize = 1000;
pub const MAX_COINS: usize = 1000;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameConfig {
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    /// Vertical velocity applied on jump; negative is up.
    #[serde(default = "default_jump_velocity")]
    pub jump_velocity: f32,
    #[serde(default = "default_enemy_speed")]
    pub enemy_speed: f32,
    #[serde(default = "default_patrol_offset")]
    pub patrol_offset: f32,
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
    #[serde(default = "default_projectile_length")]
    pub projectile_length: f32,
    #[serde(default = "default_projectile_thickness")]
    pub projectile_thickness: f32,
    #[serde(default = "default_shoot_duration")]
    pub shoot_duration: f32,
    #[serde(default = "default_player_frame_interval")]
    pub player_frame_interval: f32,
    #[serde(default = "default_enemy_frame_interval")]
    pub enemy_frame_interval: f32,
    #[serde(default = "default_camera_zoom")]
    pub camera_zoom: f32,
    /// Camera target sits this far above the vertical screen centre.
    #[serde(default = "default_camera_lift")]
    pub camera_lift: f32,
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            player_speed: default_player_speed(),
            jump_velocity: default_jump_velocity(),
            enemy_speed: default_enemy_speed(),
            patrol_offset: default_patrol_offset(),
            projectile_speed: default_projectile_speed(),
            projectile_length: default_projectile_length(),
            projectile_thickness: default_projectile_thickness(),
            shoot_duration: default_shoot_duration(),
            player_frame_interval: default_player_frame_interval(),
            enemy_frame_interval: default_enemy_frame_interval(),
            camera_zoom: default_camera_zoom(),
            camera_lift: default_camera_lift(),
            music_volume: default_music_volume(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(config)
}

/// Load `path` if it exists, otherwise (or on any error) use the defaults.
pub fn load_config_or_default(path: &Path) -> GameConfig {
    if !path.exists() {
        log::info!(
            "No config at '{}'; using built-in defaults.",
            path.display()
        );
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => {
            log::info!("Config loaded from '{}'", path.display());
            config
        }
        Err(err) => {
            log::warn!("{err}. Using built-in defaults.");
            GameConfig::default()
        }
    }
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    let positive = [
        ("gravity", config.gravity),
        ("player_speed", config.player_speed),
        ("enemy_speed", config.enemy_speed),
        ("patrol_offset", config.patrol_offset),
        ("projectile_speed", config.projectile_speed),
        ("projectile_length", config.projectile_length),
        ("projectile_thickness", config.projectile_thickness),
        ("shoot_duration", config.shoot_duration),
        ("player_frame_interval", config.player_frame_interval),
        ("enemy_frame_interval", config.enemy_frame_interval),
        ("camera_zoom", config.camera_zoom),
    ];
    for (name, value) in positive {
        if !(value > 0.0) {
            return Err(format!(
                "Config validation failed: {name} must be > 0 (got {value})"
            ));
        }
    }
    if config.jump_velocity >= 0.0 {
        return Err(format!(
            "Config validation failed: jump_velocity must be negative (got {})",
            config.jump_velocity
        ));
    }
    if !(0.0..=1.0).contains(&config.music_volume) {
        return Err(format!(
            "Config validation failed: music_volume must be within 0..=1 (got {})",
            config.music_volume
        ));
    }
    Ok(())
}

const fn default_gravity() -> f32 {
    800.0
}

const fn default_player_speed() -> f32 {
    200.0
}

const fn default_jump_velocity() -> f32 {
    -300.0
}

const fn default_enemy_speed() -> f32 {
    150.0
}

const fn default_patrol_offset() -> f32 {
    200.0
}

const fn default_projectile_speed() -> f32 {
    400.0
}

const fn default_projectile_length() -> f32 {
    20.0
}

const fn default_projectile_thickness() -> f32 {
    10.0
}

const fn default_shoot_duration() -> f32 {
    0.5
}

const fn default_player_frame_interval() -> f32 {
    0.15
}

const fn default_enemy_frame_interval() -> f32 {
    0.5
}

const fn default_camera_zoom() -> f32 {
    2.0
}

const fn default_camera_lift() -> f32 {
    110.0
}

const fn default_music_volume() -> f32 {
    0.5
}
