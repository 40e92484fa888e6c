//! Camera and lighting. The camera stands in for the device camera: poses
//! are expressed in its frame, so it sits at the origin looking down -Z.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;

use crate::settings::SettingsResource;

pub fn spawn_stage(
    mut commands: Commands,
    settings: Res<SettingsResource>,
    mut ambient_light: ResMut<GlobalAmbientLight>,
) {
    commands.spawn((
        Name::new("ArCamera"),
        Camera3d::default(),
        Tonemapping::AcesFitted,
        Transform::IDENTITY,
    ));

    ambient_light.color = Color::WHITE;
    ambient_light.brightness = settings.current.anchor.ambient_light_brightness;
}
