//! Spawns and removes the effects under the content root as the creature's
//! signals change, and routes the emitter anchor into the breath.

use bevy::camera::visibility::NoFrustumCulling;
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::transform::helper::TransformHelper;

use crate::anchor::{ArContentRoot, world_to_frame_local};
use crate::creature::CreatureSignal;
use crate::effects::flame::MIN_RENDER_SCALE;
use crate::effects::{AmbientFlame, BreathEffect, EffectAssets};
use crate::pose::DetectionChanged;
use crate::settings::SettingsResource;

/// Live effect entities.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct CompositionState {
    pub breath: Option<Entity>,
    pub flame: Option<Entity>,
    /// Latest emitter origin, in the content root frame.
    pub breath_origin: Option<Vec3>,
}

#[derive(Default)]
struct PendingSignals {
    flame_throwing: Option<bool>,
    ambient_flame: Option<bool>,
    emitter_world: Option<Vec3>,
}

impl PendingSignals {
    fn collect<'a>(signals: impl Iterator<Item = &'a CreatureSignal>) -> Self {
        let mut pending = Self::default();
        for signal in signals {
            match *signal {
                CreatureSignal::FlameThrowing(on) => pending.flame_throwing = Some(on),
                CreatureSignal::AmbientFlame(on) => pending.ambient_flame = Some(on),
                CreatureSignal::EmitterAnchor(world) => pending.emitter_world = Some(world),
            }
        }
        pending
    }
}

#[allow(clippy::too_many_arguments)]
pub fn compose_effects(
    mut commands: Commands,
    settings: Res<SettingsResource>,
    effect_assets: Res<EffectAssets>,
    mut composition: ResMut<CompositionState>,
    mut signals: MessageReader<CreatureSignal>,
    helper: TransformHelper,
    content_roots: Query<Entity, With<ArContentRoot>>,
    mut breaths: Query<&mut BreathEffect>,
) {
    let pending = PendingSignals::collect(signals.read());
    let Some(content_root) = content_roots.iter().next() else {
        return;
    };
    let breath_settings = &settings.current.breath;

    if let Some(world) = pending.emitter_world {
        match helper.compute_global_transform(content_root) {
            Ok(frame) => {
                let origin = world_to_frame_local(
                    world,
                    &frame,
                    Vec3::from_array(breath_settings.emitter_offset),
                );
                composition.breath_origin = Some(origin);
                if let Some(mut breath) = composition.breath.and_then(|e| breaths.get_mut(e).ok()) {
                    breath.origin = origin;
                }
            }
            Err(error) => warn!("Cannot place breath origin: {error}"),
        }
    }

    match pending.flame_throwing {
        Some(true) if composition.breath.is_none() => {
            let origin = composition
                .breath_origin
                .unwrap_or(Vec3::from_array(breath_settings.initial_origin));
            let breath = BreathEffect::new(breath_settings, origin);
            let transform = Transform::from_translation(origin)
                .with_rotation(breath.orientation())
                .with_scale(Vec3::splat(breath_settings.scale));
            let entity = commands
                .spawn((
                    Name::new("Breath"),
                    breath,
                    transform,
                    Visibility::default(),
                    NoFrustumCulling,
                    ChildOf(content_root),
                ))
                .id();
            composition.breath = Some(entity);
            debug!("Breath spawned at {origin}");
        }
        Some(false) => {
            if let Some(entity) = composition.breath.take() {
                commands.entity(entity).despawn();
                debug!("Breath removed");
            }
        }
        _ => {}
    }

    match pending.ambient_flame {
        Some(true) if composition.flame.is_none() => {
            let entity = commands
                .spawn((
                    Name::new("AmbientFlame"),
                    AmbientFlame::new(&settings.current.ambient_flame),
                    Mesh3d(effect_assets.flame_mesh.clone()),
                    MeshMaterial3d(effect_assets.flame_material.clone()),
                    Transform::from_scale(Vec3::splat(MIN_RENDER_SCALE)),
                    Visibility::default(),
                    NoFrustumCulling,
                    NotShadowCaster,
                    ChildOf(content_root),
                ))
                .id();
            composition.flame = Some(entity);
            debug!("Ambient flame spawned");
        }
        Some(false) => {
            if let Some(entity) = composition.flame.take() {
                commands.entity(entity).despawn();
            }
        }
        _ => {}
    }
}

/// Tears every effect down when the tracked object is lost. The creature's
/// reset does not report falling edges, so this is the only teardown path.
pub fn reset_composition(
    mut commands: Commands,
    mut changes: MessageReader<DetectionChanged>,
    mut composition: ResMut<CompositionState>,
) {
    if !changes.read().any(|change| *change == DetectionChanged::Lost) {
        return;
    }

    for entity in [composition.breath.take(), composition.flame.take()]
        .into_iter()
        .flatten()
    {
        commands.entity(entity).despawn();
    }
    composition.breath_origin = None;
    info!("Effects cleared");
}
