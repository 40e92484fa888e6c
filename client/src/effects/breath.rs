//! Breath: a cone of additive particles streaming from a moving origin
//! towards a fixed target.
//!
//! The effect entity sits at the origin and is turned so that its local +Y
//! points at the target. Particles are simulated on the CPU in that local
//! space and rebuilt into a single mesh every frame.

use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;
use rand::Rng;

use crate::settings::BreathSettings;

/// How much wider the cone is at its tip than at its base.
const CONE_FLARE: f32 = 2.0;
const VERTICES_PER_PARTICLE: usize = 12;

#[derive(Debug, Clone, Copy)]
struct BreathParticle {
    /// Initial position along the stream, as a fraction of the height.
    offset: f32,
    angle: f32,
    /// Distance from the axis, as a fraction of the local radius.
    spread: f32,
    speed: f32,
}

#[derive(Component, Debug, Clone)]
pub struct BreathEffect {
    /// Emission point, in the parent frame.
    pub origin: Vec3,
    /// Aim point, in the parent frame.
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
    pub rise_speed: f32,
    pub particle_size: f32,
    pub color: [f32; 4],
    /// Simulation time, advanced by frame delta.
    pub time: f32,
    particles: Vec<BreathParticle>,
    mesh: Option<Handle<Mesh>>,
}

impl BreathEffect {
    pub fn new(settings: &BreathSettings, origin: Vec3) -> Self {
        Self::with_rng(settings, origin, &mut rand::thread_rng())
    }

    pub fn with_rng(settings: &BreathSettings, origin: Vec3, rng: &mut impl Rng) -> Self {
        let particles = (0..settings.particle_count)
            .map(|_| BreathParticle {
                offset: rng.gen_range(0.0..1.0),
                angle: rng.gen_range(0.0..std::f32::consts::TAU),
                // sqrt keeps the cross-section uniformly filled
                spread: rng.gen_range(0.0_f32..1.0).sqrt(),
                speed: rng.gen_range(0.75..1.25),
            })
            .collect();

        Self {
            origin,
            target: Vec3::from_array(settings.target),
            radius: settings.radius,
            height: settings.height,
            rise_speed: settings.rise_speed,
            particle_size: settings.particle_size,
            color: settings.color,
            time: 0.0,
            particles,
            mesh: None,
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn orientation(&self) -> Quat {
        breath_orientation(self.origin, self.target)
    }

    /// Particle positions in effect-local space, with their remaining life
    /// in `[0, 1]`.
    pub fn particle_positions(&self) -> impl Iterator<Item = (Vec3, f32)> + '_ {
        self.particles.iter().map(|particle| {
            let travelled = (particle.offset + self.time * self.rise_speed * particle.speed).fract();
            let distance = self.radius * particle.spread * (1.0 + travelled * CONE_FLARE);
            let (sin, cos) = particle.angle.sin_cos();
            (
                Vec3::new(cos * distance, travelled * self.height, sin * distance),
                1.0 - travelled,
            )
        })
    }
}

/// Shortest-arc rotation taking +Y onto the direction from `origin` to
/// `target`. Identity when the two points coincide.
pub fn breath_orientation(origin: Vec3, target: Vec3) -> Quat {
    match (target - origin).try_normalize() {
        Some(direction) => Quat::from_rotation_arc(Vec3::Y, direction),
        None => Quat::IDENTITY,
    }
}

/// Advances every breath, re-aims it from its current origin and rebuilds
/// its particle mesh.
pub fn update_breath_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut effects: Query<(Entity, &mut BreathEffect, &mut Transform)>,
    mut meshes: ResMut<Assets<Mesh>>,
    material: Res<super::EffectAssets>,
) {
    let dt = time.delta_secs();

    for (entity, mut breath, mut transform) in &mut effects {
        breath.time += dt;
        transform.translation = breath.origin;
        transform.rotation = breath.orientation();

        if breath.mesh.is_none() {
            let handle = meshes.add(build_breath_mesh(&breath));
            commands.entity(entity).insert((
                Mesh3d(handle.clone()),
                MeshMaterial3d(material.breath_material.clone()),
                NotShadowCaster,
                NotShadowReceiver,
            ));
            breath.mesh = Some(handle);
            continue;
        }

        if let Some(mesh) = breath.mesh.as_ref().and_then(|handle| meshes.get_mut(handle)) {
            *mesh = build_breath_mesh(&breath);
        }
    }
}

/// Each particle is two crossed quads so it reads from any side without
/// camera-facing billboards.
pub fn build_breath_mesh(breath: &BreathEffect) -> Mesh {
    let vertex_count = breath.particle_count() * VERTICES_PER_PARTICLE;
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(vertex_count);

    for (center, life) in breath.particle_positions() {
        let half = breath.particle_size * (0.5 + 0.5 * life) * 0.5;
        let color = [
            breath.color[0],
            breath.color[1],
            breath.color[2],
            breath.color[3] * life,
        ];

        for (across, normal) in [(Vec3::X, Vec3::Z), (Vec3::Z, Vec3::X)] {
            let a = center - across * half - Vec3::Y * half;
            let b = center + across * half - Vec3::Y * half;
            let c = center + across * half + Vec3::Y * half;
            let d = center - across * half + Vec3::Y * half;

            let [a, b, c, d]: [[f32; 3]; 4] = [a.into(), b.into(), c.into(), d.into()];
            let n: [f32; 3] = normal.into();
            positions.extend_from_slice(&[a, b, c, a, c, d]);
            normals.extend_from_slice(&[n; 6]);
            uvs.extend_from_slice(&[
                [0.0, 1.0],
                [1.0, 1.0],
                [1.0, 0.0],
                [0.0, 1.0],
                [1.0, 0.0],
                [0.0, 0.0],
            ]);
            colors.extend_from_slice(&[color; 6]);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh
}

pub fn breath_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        alpha_mode: AlphaMode::Add,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        perceptual_roughness: 1.0,
        metallic: 0.0,
        reflectance: 0.0,
        ..default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPSILON: f32 = 1e-5;

    fn seeded_breath(origin: Vec3) -> BreathEffect {
        BreathEffect::with_rng(
            &BreathSettings::default(),
            origin,
            &mut StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn orientation_turns_up_axis_towards_target() {
        let origin = Vec3::new(0.4, 0.9, -0.2);
        let target = Vec3::new(0.0, 0.1, 0.0);

        let rotation = breath_orientation(origin, target);

        let expected = (target - origin).normalize();
        assert!((rotation * Vec3::Y).distance(expected) < EPSILON);
    }

    #[test]
    fn orientation_handles_degenerate_and_opposite_directions() {
        assert_eq!(breath_orientation(Vec3::ONE, Vec3::ONE), Quat::IDENTITY);

        let down = breath_orientation(Vec3::Y, Vec3::ZERO);
        assert!((down * Vec3::Y).distance(Vec3::NEG_Y) < EPSILON);
    }

    #[test]
    fn particles_stay_inside_the_cone() {
        let mut breath = seeded_breath(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(breath.particle_count(), 1000);

        for step in 0..50 {
            breath.time = step as f32 * 0.037;
            for (position, life) in breath.particle_positions() {
                let travelled = position.y / breath.height;
                assert!((0.0..=1.0).contains(&travelled));
                assert!((0.0..=1.0).contains(&life));
                let allowed = breath.radius * (1.0 + travelled * CONE_FLARE) + EPSILON;
                assert!(Vec2::new(position.x, position.z).length() <= allowed);
            }
        }
    }

    #[test]
    fn mesh_has_two_quads_per_particle() {
        let breath = seeded_breath(Vec3::ZERO);
        let mesh = build_breath_mesh(&breath);

        assert_eq!(mesh.count_vertices(), 1000 * VERTICES_PER_PARTICLE);
    }
}
