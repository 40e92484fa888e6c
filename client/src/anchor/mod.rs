//! The tracked object's frame and the content node parented under it.

pub mod emitter;

use bevy::prelude::*;

use crate::creature::CreatureResetRequest;
use crate::pose::{CurrentPose, DetectionChanged, DetectionState};
use crate::settings::SettingsResource;

pub use emitter::world_to_frame_local;

/// Follows the tracked object's pose.
#[derive(Component, Debug, Default)]
pub struct ArAnchor;

/// Parent of all AR content, offset inside the anchor frame. Both the
/// creature and the effects hang off this node.
#[derive(Component, Debug, Default)]
pub struct ArContentRoot;

pub fn spawn_anchor(mut commands: Commands, settings: Res<SettingsResource>) {
    let offset = settings.current.anchor.content_offset();

    commands
        .spawn((
            Name::new("ArAnchor"),
            ArAnchor,
            Transform::default(),
            Visibility::Hidden,
        ))
        .with_children(|anchor| {
            anchor.spawn((
                Name::new("ArContentRoot"),
                ArContentRoot,
                Transform::from_translation(offset),
                Visibility::Hidden,
            ));
        });
}

/// Copies the detected pose onto the anchor. While lost the anchor keeps its
/// last pose; its content is hidden anyway.
pub fn apply_pose_to_anchor(
    pose: Res<CurrentPose>,
    mut anchors: Query<&mut Transform, With<ArAnchor>>,
) {
    if !pose.0.detected {
        return;
    }
    let target = pose.0.to_transform();
    for mut transform in &mut anchors {
        *transform = target;
    }
}

/// The anchor appears after the first detection; its content only while the
/// object is detected.
pub fn sync_anchor_visibility(
    detection: Res<DetectionState>,
    mut anchors: Query<&mut Visibility, (With<ArAnchor>, Without<ArContentRoot>)>,
    mut content_roots: Query<&mut Visibility, (With<ArContentRoot>, Without<ArAnchor>)>,
) {
    let anchor_visibility = if detection.ever_detected {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    let content_visibility = if detection.detected {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };

    for mut visibility in &mut anchors {
        visibility.set_if_neq(anchor_visibility);
    }
    for mut visibility in &mut content_roots {
        visibility.set_if_neq(content_visibility);
    }
}

pub fn request_reset_on_loss(
    mut changes: MessageReader<DetectionChanged>,
    mut resets: MessageWriter<CreatureResetRequest>,
) {
    for change in changes.read() {
        if *change == DetectionChanged::Lost {
            resets.write(CreatureResetRequest);
        }
    }
}
