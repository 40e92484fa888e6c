use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const SETTINGS_FILE_PATH: &str = "./dragon_ar.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Dragon AR".to_string(),
            width: 720,
            height: 1280,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorSettings {
    /// Offset of the content root inside the tracked object's frame.
    pub content_offset: [f32; 3],
    pub ambient_light_brightness: f32,
}

impl Default for AnchorSettings {
    fn default() -> Self {
        Self {
            content_offset: [0.11, 0.14, 0.0],
            ambient_light_brightness: 2_000.0,
        }
    }
}

impl AnchorSettings {
    pub fn content_offset(&self) -> Vec3 {
        Vec3::from_array(self.content_offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureSettings {
    pub model_path: String,
    pub attack_clip: String,
    pub fly_clip: String,
    /// Skeleton joint whose world position feeds the breath emitter.
    pub emitter_joint: String,
    pub scale: f32,
    /// Seconds spent flying along the arrival path.
    pub path_duration: f32,
    /// Flight start, in world space.
    pub path_start_world: [f32; 3],
    /// Flight end points, in the creature's parent frame.
    pub path_end_points: Vec<[f32; 3]>,
    pub cross_fade_secs: f32,
}

impl Default for CreatureSettings {
    fn default() -> Self {
        Self {
            model_path: "models/gold_dragon.glb".to_string(),
            attack_clip: "skill02".to_string(),
            fly_clip: "stand".to_string(),
            emitter_joint: "Bone_end_40_024".to_string(),
            scale: 2.0,
            path_duration: 2.0,
            path_start_world: [7.0, 5.0, 5.0],
            path_end_points: vec![[0.6, 0.6, 2.5]],
            cross_fade_secs: 0.5,
        }
    }
}

impl CreatureSettings {
    pub fn cross_fade(&self) -> Duration {
        Duration::from_secs_f32(self.cross_fade_secs.max(0.0))
    }
}

/// Fractions of attack progress that gate the effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub flame_throwing_start: f32,
    pub flame_throwing_stop: f32,
    pub ambient_flame_start: f32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            flame_throwing_start: 0.3,
            flame_throwing_stop: 0.7,
            ambient_flame_start: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathSettings {
    pub scale: f32,
    /// Point the breath aims at, in the content root frame.
    pub target: [f32; 3],
    pub radius: f32,
    pub height: f32,
    pub particle_count: u32,
    /// Added to the emitter origin after it is moved into the content frame.
    pub emitter_offset: [f32; 3],
    /// Origin used until the first joint sample arrives.
    pub initial_origin: [f32; 3],
    /// Particle cycles per second along the emission axis.
    pub rise_speed: f32,
    pub particle_size: f32,
    pub color: [f32; 4],
}

impl Default for BreathSettings {
    fn default() -> Self {
        Self {
            scale: 0.8,
            target: [0.0, 0.1, 0.0],
            radius: 0.1,
            height: 4.0,
            particle_count: 1000,
            emitter_offset: [0.0, -0.05, 0.0],
            initial_origin: [1.0, 1.0, 0.0],
            rise_speed: 1.2,
            particle_size: 0.035,
            color: [1.0, 0.667, 0.4, 0.85],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientFlameSettings {
    pub scale: f32,
    pub speed_factor: f32,
    pub growth_speed_factor: f32,
}

impl Default for AmbientFlameSettings {
    fn default() -> Self {
        Self {
            scale: 0.2,
            speed_factor: 3.0,
            growth_speed_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSettings {
    /// Scripted pose track, relative to the asset root. Without one the
    /// object is held steady in front of the camera.
    pub track: Option<String>,
}

impl Default for PoseSettings {
    fn default() -> Self {
        Self {
            track: Some("poses/demo_track.json".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct ArSettings {
    pub window: WindowSettings,
    pub anchor: AnchorSettings,
    pub creature: CreatureSettings,
    pub timeline: TimelineSettings,
    pub breath: BreathSettings,
    pub ambient_flame: AmbientFlameSettings,
    pub pose: PoseSettings,
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsValidationError {
    #[error("creature.path_duration must be a positive number of seconds, got {0}")]
    PathDuration(f32),
    #[error("creature.path_end_points must contain at least one point")]
    NoPathEndPoints,
    #[error("creature.cross_fade_secs must be finite and non-negative, got {0}")]
    CrossFade(f32),
    #[error("creature.{field} must name an asset entry")]
    EmptyName { field: &'static str },
    #[error(
        "timeline thresholds must satisfy 0 <= start < stop <= 1, got start={start} stop={stop}"
    )]
    FlameThrowingWindow { start: f32, stop: f32 },
    #[error("timeline.ambient_flame_start must lie in [0, 1], got {0}")]
    AmbientFlameStart(f32),
    #[error("breath.particle_count must be at least 1")]
    NoParticles,
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

#[derive(Debug, Error)]
pub enum SettingsIoError {
    #[error("failed to read settings file: {0}")]
    Read(std::io::Error),
    #[error("failed to decode YAML settings: {0}")]
    Deserialize(serde_yaml::Error),
    #[error("invalid settings: {0}")]
    Invalid(#[from] SettingsValidationError),
}

impl ArSettings {
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        let creature = &self.creature;
        if !(creature.path_duration.is_finite() && creature.path_duration > 0.0) {
            return Err(SettingsValidationError::PathDuration(creature.path_duration));
        }
        if creature.path_end_points.is_empty() {
            return Err(SettingsValidationError::NoPathEndPoints);
        }
        if !(creature.cross_fade_secs.is_finite() && creature.cross_fade_secs >= 0.0) {
            return Err(SettingsValidationError::CrossFade(creature.cross_fade_secs));
        }
        for (field, value) in [
            ("model_path", &creature.model_path),
            ("attack_clip", &creature.attack_clip),
            ("fly_clip", &creature.fly_clip),
            ("emitter_joint", &creature.emitter_joint),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsValidationError::EmptyName { field });
            }
        }

        let timeline = &self.timeline;
        let (start, stop) = (timeline.flame_throwing_start, timeline.flame_throwing_stop);
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&stop) || start >= stop {
            return Err(SettingsValidationError::FlameThrowingWindow { start, stop });
        }
        if !(0.0..=1.0).contains(&timeline.ambient_flame_start) {
            return Err(SettingsValidationError::AmbientFlameStart(
                timeline.ambient_flame_start,
            ));
        }

        if self.breath.particle_count == 0 {
            return Err(SettingsValidationError::NoParticles);
        }

        for (field, value) in [
            ("creature.scale", creature.scale),
            ("breath.scale", self.breath.scale),
            ("breath.radius", self.breath.radius),
            ("breath.height", self.breath.height),
            ("ambient_flame.scale", self.ambient_flame.scale),
            ("ambient_flame.speed_factor", self.ambient_flame.speed_factor),
            (
                "ambient_flame.growth_speed_factor",
                self.ambient_flame.growth_speed_factor,
            ),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsValidationError::NotPositive { field, value });
            }
        }

        Ok(())
    }
}

#[derive(Resource, Clone)]
pub struct SettingsResource {
    pub current: ArSettings,
}

impl SettingsResource {
    pub fn new(current: ArSettings) -> Self {
        Self { current }
    }
}

pub fn load_settings_or_default() -> ArSettings {
    let path = Path::new(SETTINGS_FILE_PATH);

    if !path.exists() {
        return ArSettings::default();
    }

    match load_settings_from_path(path) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!(
                "Failed to load settings from '{}': {}. Falling back to defaults.",
                SETTINGS_FILE_PATH, error
            );
            ArSettings::default()
        }
    }
}

pub fn load_settings_from_path(path: &Path) -> Result<ArSettings, SettingsIoError> {
    let raw = fs::read_to_string(path).map_err(SettingsIoError::Read)?;
    parse_settings(&raw)
}

pub fn parse_settings(raw: &str) -> Result<ArSettings, SettingsIoError> {
    let settings =
        serde_yaml::from_str::<ArSettings>(raw).map_err(SettingsIoError::Deserialize)?;
    settings.validate()?;
    Ok(settings)
}
