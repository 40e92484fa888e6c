//! The two effects the creature triggers: the breath stream and the ambient
//! flame.

pub mod breath;
pub mod flame;
pub mod flame_material;

use bevy::prelude::*;

pub use breath::{BreathEffect, breath_orientation};
pub use flame::{AmbientFlame, GrowthEnvelope};
pub use flame_material::{FlameMaterial, FlameParams};

/// Shared render assets for the effects.
#[derive(Resource, Debug, Clone, Default)]
pub struct EffectAssets {
    pub breath_material: Handle<StandardMaterial>,
    pub flame_material: Handle<FlameMaterial>,
    pub flame_mesh: Handle<Mesh>,
}

pub fn setup_effect_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut standard_materials: ResMut<Assets<StandardMaterial>>,
    mut flame_materials: ResMut<Assets<FlameMaterial>>,
) {
    // Unit sphere lifted so the flame grows up from its base.
    let flame_mesh = Sphere::new(0.5)
        .mesh()
        .uv(32, 32)
        .translated_by(Vec3::new(0.0, 0.5, 0.0));

    commands.insert_resource(EffectAssets {
        breath_material: standard_materials.add(breath::breath_material()),
        flame_material: flame_materials.add(FlameMaterial::default()),
        flame_mesh: meshes.add(flame_mesh),
    });
}
