//! Binding the creature's glTF scene to the controller: clips, animation
//! graph, animation player and the joint feeding the breath emitter.

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

use super::Creature;
use crate::AppState;
use crate::settings::SettingsResource;

#[derive(Resource, Debug, Clone)]
pub struct CreatureAssets {
    pub gltf: Handle<Gltf>,
    pub scene: Handle<Scene>,
}

/// Resolved rig of a spawned creature.
#[derive(Component, Debug, Clone)]
pub struct CreatureRig {
    pub player: Entity,
    pub joint: Entity,
    pub attack_node: AnimationNodeIndex,
    pub fly_node: AnimationNodeIndex,
    pub attack_clip_duration: f32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreatureRigError {
    #[error("animation clip '{0}' is missing from the creature model")]
    MissingClip(String),
    #[error("joint '{0}' is missing from the creature scene")]
    MissingJoint(String),
    #[error("animation clip '{0}' did not load")]
    ClipNotLoaded(String),
    #[error("creature scene has no animation player")]
    MissingAnimationPlayer,
    #[error("creature model failed to load: {0}")]
    ModelLoad(String),
}

struct ResolvedClips {
    attack: Handle<AnimationClip>,
    fly: Handle<AnimationClip>,
    attack_duration: f32,
}

/// Waits for the model and the spawned scene, then binds the rig once.
/// Missing clips, joints or players stop the app.
#[allow(clippy::too_many_arguments)]
pub fn bind_creature_rig(
    mut commands: Commands,
    settings: Res<SettingsResource>,
    assets: Res<CreatureAssets>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    clips: Res<Assets<AnimationClip>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    creatures: Query<Entity, (With<Creature>, Without<CreatureRig>)>,
    children_query: Query<&Children>,
    names: Query<&Name>,
    mut players: Query<&mut AnimationPlayer>,
    mut next_state: ResMut<NextState<AppState>>,
    mut exit: MessageWriter<AppExit>,
    mut failed: Local<bool>,
) {
    if *failed {
        return;
    }
    if let LoadState::Failed(error) = asset_server.load_state(&assets.gltf) {
        fail(
            &mut failed,
            &mut exit,
            &CreatureRigError::ModelLoad(error.to_string()),
        );
        return;
    }
    let Some(gltf) = gltfs.get(&assets.gltf) else {
        return;
    };
    if !asset_server.is_loaded_with_dependencies(&assets.gltf) {
        return;
    }

    let creature_settings = &settings.current.creature;
    let resolved = match resolve_clips(
        gltf,
        &clips,
        &creature_settings.attack_clip,
        &creature_settings.fly_clip,
    ) {
        Ok(resolved) => resolved,
        Err(error) => {
            fail(&mut failed, &mut exit, &error);
            return;
        }
    };

    for creature in &creatures {
        // The scene spawner parents the whole scene at once.
        if children_query.get(creature).is_err() {
            continue;
        }

        let player = match find_in_subtree(creature, &children_query, |entity| {
            players.contains(entity)
        }) {
            Some(player) => player,
            None => {
                fail(
                    &mut failed,
                    &mut exit,
                    &CreatureRigError::MissingAnimationPlayer,
                );
                return;
            }
        };
        let joint_name = creature_settings.emitter_joint.as_str();
        let Some(joint) = find_in_subtree(creature, &children_query, |entity| {
            names
                .get(entity)
                .is_ok_and(|name| name.as_str() == joint_name)
        }) else {
            fail(
                &mut failed,
                &mut exit,
                &CreatureRigError::MissingJoint(joint_name.to_string()),
            );
            return;
        };

        let (graph, nodes) =
            AnimationGraph::from_clips([resolved.attack.clone(), resolved.fly.clone()]);
        let rig = CreatureRig {
            player,
            joint,
            attack_node: nodes[0],
            fly_node: nodes[1],
            attack_clip_duration: resolved.attack_duration,
        };

        let Ok(mut animation_player) = players.get_mut(player) else {
            continue;
        };
        let mut transitions = AnimationTransitions::new();
        transitions
            .play(&mut animation_player, rig.fly_node, Duration::ZERO)
            .repeat();

        commands
            .entity(player)
            .insert((AnimationGraphHandle(graphs.add(graph)), transitions));
        info!(
            "Creature rig bound: player {:?}, joint '{}' {:?}, attack clip {:.2}s",
            rig.player, joint_name, rig.joint, rig.attack_clip_duration
        );
        commands.entity(creature).insert(rig);
        next_state.set(AppState::Running);
    }
}

fn resolve_clips(
    gltf: &Gltf,
    clips: &Assets<AnimationClip>,
    attack_name: &str,
    fly_name: &str,
) -> Result<ResolvedClips, CreatureRigError> {
    let attack = named_clip(gltf, attack_name)?;
    let fly = named_clip(gltf, fly_name)?;
    let attack_duration = clips
        .get(&attack)
        .map(AnimationClip::duration)
        .ok_or_else(|| CreatureRigError::ClipNotLoaded(attack_name.to_string()))?;
    if clips.get(&fly).is_none() {
        return Err(CreatureRigError::ClipNotLoaded(fly_name.to_string()));
    }

    Ok(ResolvedClips {
        attack,
        fly,
        attack_duration,
    })
}

fn named_clip(gltf: &Gltf, name: &str) -> Result<Handle<AnimationClip>, CreatureRigError> {
    gltf.named_animations
        .get(name)
        .cloned()
        .ok_or_else(|| CreatureRigError::MissingClip(name.to_string()))
}

fn fail(failed: &mut bool, exit: &mut MessageWriter<AppExit>, error: &CreatureRigError) {
    *failed = true;
    error!("Failed to bind creature rig: {error}");
    exit.write(AppExit::error());
}

/// Breadth-first search below `root` (inclusive).
pub fn find_in_subtree(
    root: Entity,
    children_query: &Query<&Children>,
    mut matches: impl FnMut(Entity) -> bool,
) -> Option<Entity> {
    let mut queue = VecDeque::from([root]);
    while let Some(entity) = queue.pop_front() {
        if matches(entity) {
            return Some(entity);
        }
        if let Ok(children) = children_query.get(entity) {
            queue.extend(children.iter());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[derive(Resource, Default)]
    struct Found(Option<Entity>);

    #[test]
    fn finds_named_joint_below_root() {
        let mut world = World::new();
        let joint = world.spawn(Name::new("Bone_end_40_024")).id();
        let neck = world.spawn(Name::new("Neck")).add_child(joint).id();
        let root = world.spawn(Name::new("Root")).add_child(neck).id();
        world.init_resource::<Found>();

        world
            .run_system_once(
                move |children: Query<&Children>, names: Query<&Name>, mut found: ResMut<Found>| {
                    found.0 = find_in_subtree(root, &children, |entity| {
                        names
                            .get(entity)
                            .is_ok_and(|name| name.as_str() == "Bone_end_40_024")
                    });
                },
            )
            .expect("system runs");

        assert_eq!(world.resource::<Found>().0, Some(joint));
    }

    #[test]
    fn missing_entries_report_their_names() {
        assert_eq!(
            CreatureRigError::MissingJoint("Bone_end_40_024".to_string()).to_string(),
            "joint 'Bone_end_40_024' is missing from the creature scene"
        );
        assert_eq!(
            CreatureRigError::MissingClip("skill02".to_string()).to_string(),
            "animation clip 'skill02' is missing from the creature model"
        );
    }
}
