use bevy::pbr::MaterialPlugin;
use bevy::prelude::*;

use crate::AppState;
use crate::anchor;
use crate::composer::{self, CompositionState};
use crate::creature::rig::bind_creature_rig;
use crate::creature::{self, CreatureConfig, CreatureResetRequest, CreatureSignal, systems};
use crate::effects::{self, EffectAssets, FlameMaterial, breath, flame};
use crate::pose::{self, CurrentPose, DetectionChanged, DetectionState, object_detected};
use crate::runtime::pipeline::ArPipelineSet;
use crate::settings::SettingsResource;
use crate::stage;
use crate::ui::OverlayPlugin;

fn runtime_state_is_active(state: Res<State<AppState>>) -> bool {
    matches!(state.get(), AppState::Running)
}

fn runtime_state_is_loading(state: Res<State<AppState>>) -> bool {
    matches!(state.get(), AppState::Loading)
}

/// Pose intake, creature timeline and effect composition. Renders nothing,
/// so it runs on `MinimalPlugins` as well.
pub fn register_ar_logic(app: &mut App) {
    let creature_config = app
        .world()
        .get_resource::<SettingsResource>()
        .map(|settings| CreatureConfig::from_settings(&settings.current))
        .unwrap_or_default();

    app.add_message::<DetectionChanged>()
        .add_message::<CreatureResetRequest>()
        .add_message::<CreatureSignal>()
        .insert_resource(creature_config)
        .init_resource::<CurrentPose>()
        .init_resource::<DetectionState>()
        .init_resource::<CompositionState>()
        .init_resource::<EffectAssets>()
        .add_systems(Startup, (pose::install_pose_source, anchor::spawn_anchor))
        .configure_sets(
            Update,
            (
                ArPipelineSet::AssetLoad,
                ArPipelineSet::Pose,
                ArPipelineSet::Creature,
                ArPipelineSet::Compose,
                ArPipelineSet::Effects,
                ArPipelineSet::UiSync,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                pose::sample_pose,
                pose::track_detection,
                anchor::apply_pose_to_anchor,
                anchor::request_reset_on_loss,
            )
                .chain()
                .in_set(ArPipelineSet::Pose),
        )
        .add_systems(
            Update,
            anchor::sync_anchor_visibility
                .after(pose::track_detection)
                .in_set(ArPipelineSet::Pose)
                .run_if(runtime_state_is_active),
        )
        .add_systems(
            Update,
            systems::apply_creature_resets.in_set(ArPipelineSet::Creature),
        )
        .add_systems(
            Update,
            (systems::sample_creature_frames, systems::advance_creature)
                .chain()
                .after(systems::apply_creature_resets)
                .in_set(ArPipelineSet::Creature)
                .run_if(runtime_state_is_active)
                .run_if(object_detected),
        )
        .add_systems(
            Update,
            composer::reset_composition.in_set(ArPipelineSet::Compose),
        )
        .add_systems(
            Update,
            composer::compose_effects
                .after(composer::reset_composition)
                .in_set(ArPipelineSet::Compose)
                .run_if(runtime_state_is_active)
                .run_if(object_detected),
        );
}

/// Everything that needs the renderer and the asset server on top of
/// [`register_ar_logic`].
pub fn register_ar_runtime(app: &mut App) {
    register_ar_logic(app);

    app.add_plugins(MaterialPlugin::<FlameMaterial>::default())
        .add_plugins(OverlayPlugin)
        .add_systems(Startup, (effects::setup_effect_assets, stage::spawn_stage))
        .add_systems(PostStartup, creature::spawn_creature)
        .add_systems(
            Update,
            bind_creature_rig
                .in_set(ArPipelineSet::AssetLoad)
                .run_if(runtime_state_is_loading),
        )
        .add_systems(
            Update,
            (
                breath::update_breath_effects,
                flame::update_ambient_flames,
            )
                .in_set(ArPipelineSet::Effects)
                .run_if(runtime_state_is_active),
        );
}
