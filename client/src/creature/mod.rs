//! The creature: spawning, rig binding and its arrival/attack/idle timeline.

pub mod path;
pub mod rig;
pub mod state;
pub mod systems;

use bevy::gltf::GltfAssetLabel;
use bevy::prelude::*;
use std::time::Duration;

use crate::anchor::ArContentRoot;
use crate::settings::{ArSettings, SettingsResource};

pub use path::{FlightPath, FlightPathSpec};
pub use rig::{CreatureAssets, CreatureRig, CreatureRigError};
pub use state::{CreatureEvent, CreatureState, CreatureTimeline, TickInput};

#[derive(Component, Debug, Default)]
pub struct Creature;

/// Owns the creature's timeline state.
#[derive(Component, Debug, Default)]
pub struct CreatureController {
    pub state: CreatureState,
}

/// World-space inputs sampled for the controller before it advances.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct CreatureFrame {
    pub parent_world: Option<GlobalTransform>,
    pub joint_world: Option<Vec3>,
}

/// Puts every creature back to the start of its arrival.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatureResetRequest;

/// Edge-triggered effect signals, plus the emitter joint while throwing.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum CreatureSignal {
    FlameThrowing(bool),
    AmbientFlame(bool),
    /// Emitter joint, in world space.
    EmitterAnchor(Vec3),
}

#[derive(Resource, Debug, Clone)]
pub struct CreatureConfig {
    pub timeline: CreatureTimeline,
    pub path: FlightPathSpec,
    pub cross_fade: Duration,
}

impl CreatureConfig {
    pub fn from_settings(settings: &ArSettings) -> Self {
        let creature = &settings.creature;
        Self {
            timeline: CreatureTimeline::from_settings(creature, &settings.timeline),
            path: FlightPathSpec {
                start_world: Vec3::from_array(creature.path_start_world),
                end_points: creature
                    .path_end_points
                    .iter()
                    .copied()
                    .map(Vec3::from_array)
                    .collect(),
            },
            cross_fade: creature.cross_fade(),
        }
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self::from_settings(&ArSettings::default())
    }
}

pub fn spawn_creature(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<SettingsResource>,
    content_root: Single<Entity, With<ArContentRoot>>,
) {
    let creature = &settings.current.creature;
    let assets = CreatureAssets {
        gltf: asset_server.load(creature.model_path.clone()),
        scene: asset_server.load(GltfAssetLabel::Scene(0).from_asset(creature.model_path.clone())),
    };

    let entity = commands
        .spawn((
            Name::new("Creature"),
            Creature,
            CreatureController::default(),
            CreatureFrame::default(),
            SceneRoot(assets.scene.clone()),
            Transform::from_translation(Vec3::from_array(creature.path_start_world))
                .with_scale(Vec3::splat(creature.scale)),
        ))
        .id();
    commands.entity(*content_root).add_child(entity);
    commands.insert_resource(assets);

    info!("Creature spawned from '{}'", creature.model_path);
}
