use bevy::animation::RepeatAnimation;
use bevy::prelude::*;
use bevy::transform::helper::TransformHelper;
use common::{AnimationPhase, FrameDelta};
use std::time::Duration;

use super::state::{ClipCommand, CreatureEvent, TickInput};
use super::{
    Creature, CreatureConfig, CreatureController, CreatureFrame, CreatureResetRequest, CreatureRig,
    CreatureSignal,
};

type RigPlayers<'w, 's> =
    Query<'w, 's, (&'static mut AnimationPlayer, &'static mut AnimationTransitions)>;

/// Samples the parent frame and, while attacking, the emitter joint. Both are
/// recomputed from local transforms so they reflect this frame's anchor pose.
pub fn sample_creature_frames(
    helper: TransformHelper,
    mut creatures: Query<
        (
            &ChildOf,
            &CreatureController,
            Option<&CreatureRig>,
            &mut CreatureFrame,
        ),
        With<Creature>,
    >,
) {
    for (child_of, controller, rig, mut frame) in &mut creatures {
        frame.parent_world = helper.compute_global_transform(child_of.parent()).ok();
        frame.joint_world = match (controller.state.phase(), rig) {
            (AnimationPhase::Attacking, Some(rig)) => helper
                .compute_global_transform(rig.joint)
                .ok()
                .map(|joint| joint.translation()),
            _ => None,
        };
    }
}

pub fn apply_creature_resets(
    mut resets: MessageReader<CreatureResetRequest>,
    mut creatures: Query<(&mut CreatureController, Option<&CreatureRig>), With<Creature>>,
    mut players: RigPlayers,
) {
    if resets.read().count() == 0 {
        return;
    }

    for (mut controller, rig) in &mut creatures {
        controller.state.reset();
        if let Some(rig) = rig {
            play_clip(&mut players, rig, ClipCommand::ResumeFly, Duration::ZERO);
        }
    }
    info!("Creature reset");
}

pub fn advance_creature(
    time: Res<Time>,
    config: Res<CreatureConfig>,
    mut creatures: Query<
        (
            &mut CreatureController,
            &mut Transform,
            &CreatureFrame,
            &CreatureRig,
        ),
        With<Creature>,
    >,
    mut players: RigPlayers,
    mut signals: MessageWriter<CreatureSignal>,
) {
    let delta = frame_delta(time.delta_secs());

    for (mut controller, mut transform, frame, rig) in &mut creatures {
        let Some(parent_world) = frame.parent_world else {
            continue;
        };
        let input = TickInput {
            delta,
            parent_world: parent_world.affine(),
            path_spec: &config.path,
            attack_clip_duration: rig.attack_clip_duration,
            joint_world: frame.joint_world,
        };

        let step = std::mem::take(&mut controller.state).step(&input, &config.timeline);
        controller.state = step.state;

        if let Some(pose) = step.arrival_pose {
            transform.translation = pose.translation;
            if let Some(rotation) = pose.rotation {
                transform.rotation = rotation;
            }
        }
        if let Some(command) = step.clip {
            play_clip(&mut players, rig, command, config.cross_fade);
        }

        for event in step.events {
            if let Some(signal) = publish(event) {
                signals.write(signal);
            }
        }
    }
}

fn frame_delta(seconds: f32) -> FrameDelta {
    FrameDelta::new(seconds).unwrap_or_else(|| {
        warn!("Invalid frame delta {seconds}, treating it as zero");
        FrameDelta::ZERO
    })
}

fn publish(event: CreatureEvent) -> Option<CreatureSignal> {
    match event {
        CreatureEvent::PhaseEntered(phase) => {
            match phase {
                AnimationPhase::Arriving => info!("Creature arriving"),
                AnimationPhase::Attacking => info!("Creature attacking"),
                AnimationPhase::Idle => info!("Creature standing by"),
            }
            None
        }
        CreatureEvent::FlameThrowing(on) => {
            if on {
                info!("Creature starts flame throwing");
            } else {
                info!("Creature stops flame throwing");
            }
            Some(CreatureSignal::FlameThrowing(on))
        }
        CreatureEvent::AmbientFlame(on) => {
            info!("Ambient flame {}", if on { "starts" } else { "stops" });
            Some(CreatureSignal::AmbientFlame(on))
        }
        CreatureEvent::EmitterAnchor(world) => Some(CreatureSignal::EmitterAnchor(world)),
    }
}

fn play_clip(
    players: &mut RigPlayers,
    rig: &CreatureRig,
    command: ClipCommand,
    cross_fade: Duration,
) {
    let Ok((mut player, mut transitions)) = players.get_mut(rig.player) else {
        warn!("Creature animation player {:?} is gone", rig.player);
        return;
    };

    match command {
        ClipCommand::PlayAttackOnce => {
            transitions
                .play(&mut player, rig.attack_node, cross_fade)
                .set_repeat(RepeatAnimation::Never);
        }
        ClipCommand::ResumeFly => {
            transitions
                .play(&mut player, rig.fly_node, cross_fade)
                .repeat();
        }
    }
}
