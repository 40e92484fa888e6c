use bevy::prelude::*;

/// Re-expresses a world-space point in the local space of `frame`, then adds
/// `offset` in that local space.
///
/// `frame` must be the frame's transform for the current frame; the anchor
/// moves every frame, so a value propagated last frame lands one frame stale.
pub fn world_to_frame_local(world: Vec3, frame: &GlobalTransform, offset: Vec3) -> Vec3 {
    frame.affine().inverse().transform_point3(world) + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_3;

    const EPSILON: f32 = 1e-4;

    fn assert_vec3_eq(actual: Vec3, expected: Vec3) {
        assert!(
            actual.distance(expected) <= EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn tracked_frame() -> GlobalTransform {
        GlobalTransform::from(
            Transform::from_xyz(0.3, -1.2, -2.0)
                .with_rotation(Quat::from_euler(EulerRot::YXZ, FRAC_PI_3, 0.4, -0.2))
                .with_scale(Vec3::splat(0.5)),
        )
    }

    #[test]
    fn round_trips_through_frame_without_offset() {
        let frame = tracked_frame();
        let world = Vec3::new(1.5, 0.25, -3.0);

        let local = world_to_frame_local(world, &frame, Vec3::ZERO);

        assert_vec3_eq(frame.transform_point(local), world);
    }

    #[test]
    fn offset_is_applied_in_local_space() {
        let frame = tracked_frame();
        let world = Vec3::new(-0.4, 2.0, 0.7);
        let offset = Vec3::new(0.0, -0.05, 0.0);

        let plain = world_to_frame_local(world, &frame, Vec3::ZERO);
        let nudged = world_to_frame_local(world, &frame, offset);

        assert_vec3_eq(nudged - plain, offset);
    }

    #[test]
    fn identity_frame_only_adds_offset() {
        let local = world_to_frame_local(
            Vec3::new(1.0, 2.0, 3.0),
            &GlobalTransform::IDENTITY,
            Vec3::new(0.0, -0.05, 0.0),
        );
        assert_vec3_eq(local, Vec3::new(1.0, 1.95, 3.0));
    }
}
