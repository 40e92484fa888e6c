//! Engine-free creature timeline.
//!
//! `CreatureState::step` folds one frame into the state and reports what the
//! engine side has to do: where to put the creature, which clip to start and
//! which signals changed. Nothing here touches the ECS, so the whole timeline
//! runs in plain unit tests.

use bevy::math::{Affine3A, Mat3, Quat, Vec3};
use common::{AnimationPhase, Edge, EdgeSignal, FrameDelta, PhaseProgress, ease_out_quad};

use super::path::{FlightPath, FlightPathSpec};
use crate::settings::{CreatureSettings, TimelineSettings};

/// Durations and thresholds driving the phases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatureTimeline {
    pub path_duration: f32,
    pub flame_throwing_start: f32,
    pub flame_throwing_stop: f32,
    pub ambient_flame_start: f32,
}

impl CreatureTimeline {
    pub fn from_settings(creature: &CreatureSettings, timeline: &TimelineSettings) -> Self {
        Self {
            path_duration: creature.path_duration,
            flame_throwing_start: timeline.flame_throwing_start,
            flame_throwing_stop: timeline.flame_throwing_stop,
            ambient_flame_start: timeline.ambient_flame_start,
        }
    }
}

impl Default for CreatureTimeline {
    fn default() -> Self {
        Self::from_settings(&CreatureSettings::default(), &TimelineSettings::default())
    }
}

/// Everything one tick reads from the outside world.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub delta: FrameDelta,
    /// World transform of the creature's parent, fresh for this frame.
    pub parent_world: Affine3A,
    pub path_spec: &'a FlightPathSpec,
    pub attack_clip_duration: f32,
    /// World position of the emitter joint, when the rig has one.
    pub joint_world: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipCommand {
    /// Cross-fade from the fly loop into the attack, played once and held.
    PlayAttackOnce,
    /// Cross-fade back into the fly loop.
    ResumeFly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreatureEvent {
    PhaseEntered(AnimationPhase),
    FlameThrowing(bool),
    AmbientFlame(bool),
    /// Emitter joint, in world space.
    EmitterAnchor(Vec3),
}

/// Creature pose on the flight path, in the parent frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalPose {
    pub translation: Vec3,
    /// `None` when the look target coincides with the creature.
    pub rotation: Option<Quat>,
}

#[derive(Debug)]
pub struct CreatureStep {
    pub state: CreatureState,
    pub arrival_pose: Option<ArrivalPose>,
    pub clip: Option<ClipCommand>,
    pub events: Vec<CreatureEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct CreatureState {
    phase: AnimationPhase,
    arrive: PhaseProgress,
    attack: PhaseProgress,
    path: Option<FlightPath>,
    flame_throwing: EdgeSignal,
    ambient_flame: EdgeSignal,
}

impl CreatureState {
    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn arrive_progress(&self) -> PhaseProgress {
        self.arrive
    }

    pub fn attack_progress(&self) -> PhaseProgress {
        self.attack
    }

    pub fn path(&self) -> Option<&FlightPath> {
        self.path.as_ref()
    }

    pub fn is_flame_throwing(&self) -> bool {
        self.flame_throwing.get()
    }

    pub fn is_ambient_flame(&self) -> bool {
        self.ambient_flame.get()
    }

    /// Back to the start of the arrival. Signals are cleared without
    /// reporting a falling edge.
    pub fn reset(&mut self) {
        self.phase = AnimationPhase::Arriving;
        self.arrive = PhaseProgress::START;
        self.attack = PhaseProgress::START;
        self.path = None;
        self.flame_throwing.clear();
        self.ambient_flame.clear();
    }

    pub fn step(mut self, input: &TickInput<'_>, timeline: &CreatureTimeline) -> CreatureStep {
        let mut step = StepOutput::default();
        match self.phase {
            AnimationPhase::Arriving => self.arrive(input, timeline, &mut step),
            AnimationPhase::Attacking => self.attack(input, timeline, &mut step),
            AnimationPhase::Idle => {}
        }
        CreatureStep {
            state: self,
            arrival_pose: step.arrival_pose,
            clip: step.clip,
            events: step.events,
        }
    }

    fn arrive(&mut self, input: &TickInput<'_>, timeline: &CreatureTimeline, out: &mut StepOutput) {
        if self.path.is_none() {
            self.path = Some(FlightPath::build(input.path_spec, &input.parent_world));
            out.events
                .push(CreatureEvent::PhaseEntered(AnimationPhase::Arriving));
        }

        self.arrive = self.arrive.advanced(input.delta, timeline.path_duration);
        let t = self.arrive.value();

        if let Some(path) = &self.path {
            // Easing shapes the motion only; thresholds keep reading `arrive`.
            let eased = ease_out_quad(t);
            let translation = path.point_at(eased);
            let look_target = (translation + path.tangent_at(eased)) * (1.0 - t.powi(3));
            let up = world_up_in(&input.parent_world);
            out.arrival_pose = Some(ArrivalPose {
                translation,
                rotation: look_rotation(translation, look_target, up),
            });
        }

        if self.arrive.is_complete() {
            self.enter(AnimationPhase::Attacking, out);
            out.clip = Some(ClipCommand::PlayAttackOnce);
        }
    }

    fn attack(&mut self, input: &TickInput<'_>, timeline: &CreatureTimeline, out: &mut StepOutput) {
        self.attack = self
            .attack
            .advanced(input.delta, input.attack_clip_duration);

        // Once on, only passing the stop threshold turns it off.
        let throwing = if self.flame_throwing.get() {
            !self.attack.exceeds(timeline.flame_throwing_stop)
        } else {
            self.attack
                .within_open(timeline.flame_throwing_start, timeline.flame_throwing_stop)
        };
        if let Some(edge) = self.flame_throwing.update(throwing) {
            out.events
                .push(CreatureEvent::FlameThrowing(edge.is_rising()));
        }
        if self.flame_throwing.get() {
            if let Some(joint) = input.joint_world {
                out.events.push(CreatureEvent::EmitterAnchor(joint));
            }
        }

        if self.attack.exceeds(timeline.ambient_flame_start)
            && self.ambient_flame.update(true) == Some(Edge::Rising)
        {
            out.events.push(CreatureEvent::AmbientFlame(true));
        }

        if self.attack.is_complete() {
            self.enter(AnimationPhase::Idle, out);
            out.clip = Some(ClipCommand::ResumeFly);
        }
    }

    fn enter(&mut self, phase: AnimationPhase, out: &mut StepOutput) {
        self.phase = phase;
        out.events.push(CreatureEvent::PhaseEntered(phase));
    }
}

#[derive(Default)]
struct StepOutput {
    arrival_pose: Option<ArrivalPose>,
    clip: Option<ClipCommand>,
    events: Vec<CreatureEvent>,
}

/// World +Y expressed in the frame of `parent_world`.
fn world_up_in(parent_world: &Affine3A) -> Vec3 {
    parent_world
        .inverse()
        .transform_vector3(Vec3::Y)
        .try_normalize()
        .unwrap_or(Vec3::Y)
}

/// Rotation turning +Z towards `target`, keeping +Y as close to `up` as
/// possible.
pub fn look_rotation(from: Vec3, target: Vec3, up: Vec3) -> Option<Quat> {
    let forward = (target - from).try_normalize()?;
    let right = up
        .cross(forward)
        .try_normalize()
        .or_else(|| Vec3::Y.cross(forward).try_normalize())
        .unwrap_or(Vec3::X);
    let up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPSILON: f32 = 1e-5;

    fn spec() -> FlightPathSpec {
        FlightPathSpec {
            start_world: Vec3::new(7.0, 5.0, 5.0),
            end_points: vec![Vec3::new(0.6, 0.6, 2.5)],
        }
    }

    fn input(spec: &FlightPathSpec, delta: f32, attack_clip_duration: f32) -> TickInput<'_> {
        TickInput {
            delta: FrameDelta::clamped(delta),
            parent_world: Affine3A::IDENTITY,
            path_spec: spec,
            attack_clip_duration,
            joint_world: Some(Vec3::new(0.1, 0.2, 0.3)),
        }
    }

    fn attacking_state(progress: f32) -> CreatureState {
        CreatureState {
            phase: AnimationPhase::Attacking,
            arrive: PhaseProgress::COMPLETE,
            attack: PhaseProgress::from_fraction(progress),
            ..CreatureState::default()
        }
    }

    fn flame_events(events: &[CreatureEvent]) -> Vec<bool> {
        events
            .iter()
            .filter_map(|event| match event {
                CreatureEvent::FlameThrowing(on) => Some(*on),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn arrival_progress_and_transition_on_fourth_tick() {
        let spec = spec();
        let timeline = CreatureTimeline::default();
        let mut state = CreatureState::default();
        let mut observed = Vec::new();

        for tick in 1..=5 {
            let step = state.step(&input(&spec, 0.5, 1.0), &timeline);
            state = step.state;
            observed.push(state.arrive_progress().value());

            if tick < 4 {
                assert_eq!(state.phase(), AnimationPhase::Arriving);
                assert_eq!(step.clip, None);
            } else if tick == 4 {
                assert_eq!(state.phase(), AnimationPhase::Attacking);
                assert_eq!(step.clip, Some(ClipCommand::PlayAttackOnce));
                assert!(
                    step.events
                        .contains(&CreatureEvent::PhaseEntered(AnimationPhase::Attacking))
                );
            } else {
                assert_eq!(step.clip, None);
                assert!(step.arrival_pose.is_none());
            }
        }

        assert_eq!(observed, vec![0.25, 0.5, 0.75, 1.0, 1.0]);
    }

    #[test]
    fn arrival_builds_path_once_and_lands_on_end_point() {
        let spec = spec();
        let timeline = CreatureTimeline::default();

        let first = CreatureState::default().step(&input(&spec, 0.5, 1.0), &timeline);
        assert!(
            first
                .events
                .contains(&CreatureEvent::PhaseEntered(AnimationPhase::Arriving))
        );
        let second = first.state.step(&input(&spec, 0.5, 1.0), &timeline);
        assert!(
            !second
                .events
                .contains(&CreatureEvent::PhaseEntered(AnimationPhase::Arriving))
        );

        let last = second.state.step(&input(&spec, 10.0, 1.0), &timeline);
        let pose = last.arrival_pose.expect("arrival tick must pose the creature");
        let end = last.state.path().expect("path is kept").end_point();
        assert!(pose.translation.distance(end) < 1e-4);
        assert!(pose.translation.distance(Vec3::new(0.6, 0.6, -2.5)) < 1e-4);
    }

    #[test]
    fn creature_faces_the_origin_when_it_lands() {
        let spec = spec();
        let step = CreatureState::default().step(&input(&spec, 5.0, 1.0), &CreatureTimeline::default());
        let pose = step.arrival_pose.expect("arrival pose");
        let rotation = pose.rotation.expect("look target differs from position");

        let forward = rotation * Vec3::Z;
        let to_origin = (-pose.translation).normalize();
        assert!(forward.distance(to_origin) < 1e-4);
    }

    #[test]
    fn flame_throwing_starts_on_fourth_attack_tick() {
        let spec = spec();
        let timeline = CreatureTimeline::default();
        let mut state = attacking_state(0.0);

        for tick in 1..=4 {
            let step = state.step(&input(&spec, 0.1, 1.0), &timeline);
            state = step.state;
            if tick == 3 {
                assert_eq!(state.attack_progress().value(), 0.3);
                assert!(flame_events(&step.events).is_empty());
                assert!(!state.is_flame_throwing());
            }
            if tick == 4 {
                assert_eq!(flame_events(&step.events), vec![true]);
                assert!(
                    step.events
                        .contains(&CreatureEvent::EmitterAnchor(Vec3::new(0.1, 0.2, 0.3)))
                );
            }
        }
    }

    #[test]
    fn threshold_equality_does_not_toggle() {
        let spec = spec();
        let timeline = CreatureTimeline::default();

        let at_start = attacking_state(0.3).step(&input(&spec, 0.0, 1.0), &timeline);
        assert!(!at_start.state.is_flame_throwing());

        let just_past = f32::from_bits(0.3_f32.to_bits() + 1);
        let past_start = attacking_state(just_past).step(&input(&spec, 0.0, 1.0), &timeline);
        assert!(past_start.state.is_flame_throwing());

        let at_ambient = attacking_state(0.5).step(&input(&spec, 0.0, 1.0), &timeline);
        assert!(!at_ambient.state.is_ambient_flame());
    }

    #[test]
    fn flame_throwing_holds_at_stop_threshold() {
        let spec = spec();
        let timeline = CreatureTimeline::default();
        let mut state = attacking_state(0.7);
        state.flame_throwing.update(true);

        let at_stop = state.step(&input(&spec, 0.0, 1.0), &timeline);
        assert!(flame_events(&at_stop.events).is_empty());
        assert!(at_stop.state.is_flame_throwing());
        assert!(
            at_stop
                .events
                .contains(&CreatureEvent::EmitterAnchor(Vec3::new(0.1, 0.2, 0.3)))
        );

        let past_stop = at_stop.state.step(&input(&spec, 0.01, 1.0), &timeline);
        assert_eq!(flame_events(&past_stop.events), vec![false]);
        assert!(!past_stop.state.is_flame_throwing());
    }

    #[test]
    fn signals_fire_exactly_once_per_transition_over_a_sweep() {
        let spec = spec();
        let timeline = CreatureTimeline::default();
        let mut state = attacking_state(0.0);
        let mut flame = Vec::new();
        let mut ambient = Vec::new();
        let mut anchors = 0;

        for _ in 0..200 {
            let step = state.step(&input(&spec, 0.01, 1.0), &timeline);
            state = step.state;
            for event in step.events {
                match event {
                    CreatureEvent::FlameThrowing(on) => {
                        flame.push((on, state.attack_progress().value()))
                    }
                    CreatureEvent::AmbientFlame(on) => ambient.push(on),
                    CreatureEvent::EmitterAnchor(_) => anchors += 1,
                    CreatureEvent::PhaseEntered(_) => {}
                }
            }
        }

        assert_eq!(flame.len(), 2);
        assert!(flame[0].0 && flame[0].1 > 0.3);
        assert!(!flame[1].0 && flame[1].1 > 0.7);
        assert_eq!(ambient, vec![true]);
        assert!(anchors > 0);
        assert_eq!(state.phase(), AnimationPhase::Idle);
        assert!(state.is_ambient_flame());
        assert!(!state.is_flame_throwing());
    }

    #[test]
    fn attack_completion_resumes_fly_clip() {
        let spec = spec();
        let step = attacking_state(0.95).step(&input(&spec, 0.1, 1.0), &CreatureTimeline::default());

        assert_eq!(step.state.phase(), AnimationPhase::Idle);
        assert_eq!(step.clip, Some(ClipCommand::ResumeFly));

        let idle = step.state.step(&input(&spec, 0.1, 1.0), &CreatureTimeline::default());
        assert!(idle.events.is_empty());
        assert_eq!(idle.clip, None);
    }

    #[test]
    fn missing_joint_skips_emitter_anchor_only() {
        let spec = spec();
        let mut tick = input(&spec, 0.0, 1.0);
        tick.joint_world = None;

        let step = attacking_state(0.5).step(&tick, &CreatureTimeline::default());

        assert_eq!(flame_events(&step.events), vec![true]);
        assert!(
            !step
                .events
                .iter()
                .any(|event| matches!(event, CreatureEvent::EmitterAnchor(_)))
        );
    }

    #[test]
    fn reset_mid_attack_clears_everything() {
        let spec = spec();
        let timeline = CreatureTimeline::default();
        let mut state = CreatureState::default()
            .step(&input(&spec, 5.0, 1.0), &timeline)
            .state
            .step(&input(&spec, 0.55, 1.0), &timeline)
            .state;
        assert!(state.is_flame_throwing());
        assert!(state.is_ambient_flame());

        state.reset();

        assert_eq!(state.phase(), AnimationPhase::Arriving);
        assert_eq!(state.arrive_progress(), PhaseProgress::START);
        assert_eq!(state.attack_progress(), PhaseProgress::START);
        assert!(state.path().is_none());
        assert!(!state.is_flame_throwing());
        assert!(!state.is_ambient_flame());

        state.reset();
        assert_eq!(state.phase(), AnimationPhase::Arriving);
        assert!(state.path().is_none());
    }

    #[test]
    fn progress_never_decreases_or_exceeds_one() {
        let spec = spec();
        let timeline = CreatureTimeline::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = CreatureState::default();
        let (mut arrive, mut attack) = (0.0_f32, 0.0_f32);

        for _ in 0..500 {
            let delta = rng.gen_range(0.0..0.05);
            state = state.step(&input(&spec, delta, 1.3), &timeline).state;

            let (next_arrive, next_attack) = (
                state.arrive_progress().value(),
                state.attack_progress().value(),
            );
            assert!(next_arrive >= arrive && next_arrive <= 1.0);
            assert!(next_attack >= attack && next_attack <= 1.0);
            (arrive, attack) = (next_arrive, next_attack);
        }
        assert_eq!(state.phase(), AnimationPhase::Idle);
    }

    #[test]
    fn arrival_keeps_world_up_under_a_tilted_parent() {
        let spec = spec();
        let mut tick = input(&spec, 0.5, 1.0);
        let tilt = Quat::from_rotation_z(0.6) * Quat::from_rotation_x(-0.4);
        tick.parent_world = Affine3A::from_rotation_translation(tilt, Vec3::new(0.1, 0.2, -1.0));

        let step = CreatureState::default().step(&tick, &CreatureTimeline::default());
        let pose = step.arrival_pose.expect("arrival pose");
        let world_rotation = tilt * pose.rotation.expect("rotation");

        // No roll: the creature's right axis stays horizontal in world space.
        assert!((world_rotation * Vec3::X).y.abs() < 1e-4);
        assert!((world_rotation * Vec3::Y).y > 0.0);
    }

    #[test]
    fn look_rotation_points_z_at_target() {
        let rotation =
            look_rotation(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::Y).expect("rotation");
        assert!((rotation * Vec3::Z).distance(Vec3::X) < EPSILON);
        assert!((rotation * Vec3::Y).distance(Vec3::Y) < EPSILON);

        assert!(look_rotation(Vec3::ONE, Vec3::ONE, Vec3::Y).is_none());
        let straight_up = look_rotation(Vec3::ZERO, Vec3::Y, Vec3::Y).expect("rotation");
        assert!((straight_up * Vec3::Z).distance(Vec3::Y) < EPSILON);
    }
}
