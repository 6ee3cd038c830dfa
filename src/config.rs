use crate::components::{Body, JumpParams, Padding};
use crate::enums::AnimationType;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the game configuration
pub const CONFIG_PATH: &str = "assets/config.json";

/// Game configuration matching the JSON format. Every section is optional
/// and falls back to the default tuning.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub map: MapConfig,
    pub player: PlayerConfig,
    pub physics: PhysicsConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Platform".to_string(),
            width: 32.0 * 32.0,
            height: 32.0 * 18.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Binary map file, relative to the working directory
    pub path: String,
    /// Tileset image, relative to the asset folder
    pub tileset: String,
    pub tile_size: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            path: "assets/tornila.map".to_string(),
            tileset: "testpic.png".to_string(),
            tile_size: 32,
        }
    }
}

/// Spritesheet frame range for one animation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub start: usize,
    pub end: usize,
    pub delay: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub spritesheet: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub hitbox_width: i32,
    pub hitbox_height: i32,
    /// left, top, right, bottom
    pub padding: [i32; 4],
    pub spawn: [f32; 2],
    pub animations: Vec<(AnimationType, AnimationConfig)>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spritesheet: "runnyC.png".to_string(),
            frame_width: 48,
            frame_height: 64,
            hitbox_width: 32,
            hitbox_height: 52,
            padding: [8, 12, 8, 0],
            spawn: [112.0, 32.0 * 18.0 - 128.0],
            animations: vec![
                (
                    AnimationType::Idle,
                    AnimationConfig {
                        start: 7,
                        end: 0,
                        delay: 0.0,
                    },
                ),
                (
                    AnimationType::Running,
                    AnimationConfig {
                        start: 0,
                        end: 8,
                        delay: 0.01875,
                    },
                ),
                (
                    AnimationType::Jumping,
                    AnimationConfig {
                        start: 1,
                        end: 0,
                        delay: 0.0,
                    },
                ),
                (
                    AnimationType::Falling,
                    AnimationConfig {
                        start: 6,
                        end: 0,
                        delay: 0.0,
                    },
                ),
            ],
        }
    }
}

impl PlayerConfig {
    /// Body with its origin at the bottom centre of the hitbox
    pub fn body(&self) -> Body {
        let origin = Vec2::new((self.hitbox_width / 2) as f32, self.hitbox_height as f32);
        let mut body = Body::new(self.hitbox_width, self.hitbox_height, origin);
        body.move_to(self.spawn[0], self.spawn[1]);
        body
    }

    pub fn padding(&self) -> Padding {
        let [left, top, right, bottom] = self.padding;
        Padding {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Kinematics tuning. With the defaults a tap jump reaches about 2 tiles
/// and a held jump about 5.5 tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub run_speed: f32,
    pub jump_velocity: f32,
    pub jump_time_max: f32,
    pub terminal_velocity: f32,
    /// Upper bound on a single step's delta time
    pub max_frame_time: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 5000.0,
            run_speed: 10.0 * 32.0,
            jump_velocity: 25.0 * 32.0,
            jump_time_max: 0.14,
            terminal_velocity: 30.0 * 32.0,
            max_frame_time: 0.1,
        }
    }
}

impl PhysicsConfig {
    pub fn jump_params(&self) -> JumpParams {
        JumpParams {
            gravity: self.gravity,
            run_speed: self.run_speed,
            jump_velocity: self.jump_velocity,
            jump_time_max: self.jump_time_max,
            terminal_velocity: self.terminal_velocity,
        }
    }
}

/// Load configuration from a JSON file
pub fn load_config_from_file(path: &str) -> Result<GameConfig, ConfigLoadError> {
    if !Path::new(path).exists() {
        return Err(ConfigLoadError::FileNotFound(path.to_string()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigLoadError::IoError(path.to_string(), e.to_string()))?;

    let config: GameConfig = serde_json::from_str(&contents)
        .map_err(|e| ConfigLoadError::ParseError(path.to_string(), e.to_string()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate sizes and physics constants
pub fn validate_config(config: &GameConfig) -> Result<(), ConfigLoadError> {
    if config.window.width <= 0.0 || config.window.height <= 0.0 {
        return Err(ConfigLoadError::ValidationError(
            "Window size must be positive".to_string(),
        ));
    }

    if config.map.tile_size == 0 {
        return Err(ConfigLoadError::ValidationError(
            "Tile size must be positive".to_string(),
        ));
    }

    let player = &config.player;
    if player.frame_width == 0 || player.frame_height == 0 {
        return Err(ConfigLoadError::ValidationError(
            "Player frame size must be positive".to_string(),
        ));
    }
    if player.hitbox_width <= 0 || player.hitbox_height <= 0 {
        return Err(ConfigLoadError::ValidationError(
            "Player hitbox must be positive".to_string(),
        ));
    }

    let physics = &config.physics;
    let constants = [
        ("gravity", physics.gravity),
        ("run_speed", physics.run_speed),
        ("jump_velocity", physics.jump_velocity),
        ("jump_time_max", physics.jump_time_max),
        ("terminal_velocity", physics.terminal_velocity),
        ("max_frame_time", physics.max_frame_time),
    ];
    for (name, value) in constants {
        if !(value > 0.0) {
            return Err(ConfigLoadError::ValidationError(format!(
                "Physics constant {} must be positive",
                name
            )));
        }
    }

    Ok(())
}

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLoadError {
    FileNotFound(String),
    IoError(String, String),
    ParseError(String, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigLoadError::IoError(path, err) => {
                write!(f, "IO error reading config file {}: {}", path, err)
            }
            ConfigLoadError::ParseError(path, err) => {
                write!(f, "Failed to parse config file {}: {}", path, err)
            }
            ConfigLoadError::ValidationError(msg) => write!(f, "Config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&GameConfig::default()).is_ok());
    }

    #[test]
    fn test_default_player_body() {
        let body = PlayerConfig::default().body();
        assert_eq!(body.origin, Vec2::new(16.0, 52.0));
        assert_eq!(body.hitbox.x, 96);
        assert_eq!(body.hitbox.y, 448 - 52);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "physics": { "gravity": 2500.0 },
            "window": { "title": "Test" }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config_from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.physics.gravity, 2500.0);
        assert_eq!(config.physics.jump_time_max, 0.14);
        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 1024.0);
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn test_config_file_not_found() {
        let result = load_config_from_file("nonexistent.json");
        assert!(matches!(result, Err(ConfigLoadError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ invalid json }").unwrap();
        temp_file.flush().unwrap();

        let result = load_config_from_file(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(ConfigLoadError::ParseError(_, _))));
    }

    #[test]
    fn test_negative_gravity_rejected() {
        let mut config = GameConfig::default();
        config.physics.gravity = -1.0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigLoadError::ValidationError(_))
        ));
    }

    #[test]
    fn test_nan_constant_rejected() {
        let mut config = GameConfig::default();
        config.physics.terminal_velocity = f32::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let mut config = GameConfig::default();
        config.map.tile_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_animation_list_parses() {
        let json = r#"{
            "player": {
                "animations": [["Running", { "start": 0, "end": 3, "delay": 0.1 }]]
            }
        }"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.player.animations.len(), 1);
        assert_eq!(config.player.animations[0].0, AnimationType::Running);
        assert_eq!(config.player.animations[0].1.end, 3);
    }
}
