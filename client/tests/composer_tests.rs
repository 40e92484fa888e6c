use bevy::prelude::*;

use dragon_ar::anchor::{ArAnchor, ArContentRoot};
use dragon_ar::composer::{CompositionState, compose_effects, reset_composition};
use dragon_ar::creature::CreatureSignal;
use dragon_ar::effects::{AmbientFlame, BreathEffect, EffectAssets};
use dragon_ar::pose::DetectionChanged;
use dragon_ar::settings::{ArSettings, SettingsResource};

const EPSILON: f32 = 1e-4;

fn build_app() -> (App, Entity) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_message::<CreatureSignal>()
        .add_message::<DetectionChanged>()
        .insert_resource(SettingsResource::new(ArSettings::default()))
        .init_resource::<CompositionState>()
        .init_resource::<EffectAssets>()
        .add_systems(Update, (reset_composition, compose_effects).chain());

    let world = app.world_mut();
    let anchor = world
        .spawn((
            ArAnchor,
            Transform::from_xyz(0.2, -0.1, -1.0).with_rotation(Quat::from_rotation_y(0.8)),
        ))
        .id();
    let content_root = world
        .spawn((
            ArContentRoot,
            Transform::from_xyz(0.11, 0.14, 0.0),
            ChildOf(anchor),
        ))
        .id();
    (app, content_root)
}

fn content_root_world(app: &App, content_root: Entity) -> GlobalTransform {
    let world = app.world();
    let root = world.get::<Transform>(content_root).expect("root transform");
    let parent = world.get::<ChildOf>(content_root).expect("root parent").parent();
    let anchor = world.get::<Transform>(parent).expect("anchor transform");
    GlobalTransform::from(*anchor) * GlobalTransform::from(*root)
}

#[test]
fn flame_throwing_spawns_breath_at_local_emitter_origin() {
    let (mut app, content_root) = build_app();
    let emitter_world = Vec3::new(0.5, 0.3, -0.7);

    app.world_mut().write_message(CreatureSignal::FlameThrowing(true));
    app.world_mut().write_message(CreatureSignal::EmitterAnchor(emitter_world));
    app.update();

    let breath_entity = app
        .world()
        .resource::<CompositionState>()
        .breath
        .expect("breath spawned");
    let breath = app
        .world()
        .get::<BreathEffect>(breath_entity)
        .expect("breath component");
    let child_of = app
        .world()
        .get::<ChildOf>(breath_entity)
        .expect("breath is parented");
    assert_eq!(child_of.parent(), content_root);

    let frame = content_root_world(&app, content_root);
    let expected =
        frame.affine().inverse().transform_point3(emitter_world) + Vec3::new(0.0, -0.05, 0.0);
    assert!(breath.origin.distance(expected) < EPSILON);
    assert_eq!(breath.target, Vec3::new(0.0, 0.1, 0.0));
}

#[test]
fn emitter_anchor_moves_the_live_breath() {
    let (mut app, content_root) = build_app();
    app.world_mut().write_message(CreatureSignal::FlameThrowing(true));
    app.update();

    let breath_entity = app
        .world()
        .resource::<CompositionState>()
        .breath
        .expect("breath spawned");
    let initial = app.world().get::<BreathEffect>(breath_entity).expect("breath").origin;
    assert_eq!(initial, Vec3::new(1.0, 1.0, 0.0));

    let emitter_world = Vec3::new(-0.2, 0.4, -1.3);
    app.world_mut().write_message(CreatureSignal::EmitterAnchor(emitter_world));
    app.update();

    let frame = content_root_world(&app, content_root);
    let expected =
        frame.affine().inverse().transform_point3(emitter_world) + Vec3::new(0.0, -0.05, 0.0);
    let moved = app.world().get::<BreathEffect>(breath_entity).expect("breath").origin;
    assert!(moved.distance(expected) < EPSILON);
    assert_eq!(
        app.world().resource::<CompositionState>().breath,
        Some(breath_entity)
    );
}

#[test]
fn falling_edges_remove_effects() {
    let (mut app, _) = build_app();
    app.world_mut().write_message(CreatureSignal::FlameThrowing(true));
    app.world_mut().write_message(CreatureSignal::AmbientFlame(true));
    app.update();

    let composition = app.world().resource::<CompositionState>().clone();
    let breath = composition.breath.expect("breath spawned");
    let flame = composition.flame.expect("flame spawned");
    assert!(app.world().get::<AmbientFlame>(flame).is_some());

    app.world_mut().write_message(CreatureSignal::FlameThrowing(false));
    app.update();

    let composition = app.world().resource::<CompositionState>();
    assert_eq!(composition.breath, None);
    assert_eq!(composition.flame, Some(flame));
    assert!(app.world().get_entity(breath).is_err());
}

#[test]
fn detection_loss_tears_everything_down() {
    let (mut app, _) = build_app();
    app.world_mut().write_message(CreatureSignal::FlameThrowing(true));
    app.world_mut().write_message(CreatureSignal::AmbientFlame(true));
    app.update();
    let composition = app.world().resource::<CompositionState>().clone();

    app.world_mut().write_message(DetectionChanged::Lost);
    app.update();

    assert_eq!(
        *app.world().resource::<CompositionState>(),
        CompositionState::default()
    );
    for entity in [composition.breath, composition.flame].into_iter().flatten() {
        assert!(app.world().get_entity(entity).is_err());
    }
}
