//! Ambient flame: a noise-animated flame that grows in once it has been
//! drawn, then holds its size until it is removed.

use bevy::prelude::*;
use common::ease_out_quad;

use super::flame_material::FlameMaterial;
use crate::settings::AmbientFlameSettings;

/// Zero scale makes the model matrix singular.
pub const MIN_RENDER_SCALE: f32 = 1e-4;

/// One-shot 0 to 1 growth that only starts after the first render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthEnvelope {
    progress: f32,
    ready: bool,
}

impl GrowthEnvelope {
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn mark_rendered(&mut self) {
        self.ready = true;
    }

    /// Advances by `amount` once rendered; saturates at 1.
    pub fn advance(&mut self, amount: f32) {
        if !self.ready || self.progress >= 1.0 || !(amount.is_finite() && amount > 0.0) {
            return;
        }
        self.progress = (self.progress + amount).min(1.0);
    }

    pub fn scale_factor(&self) -> f32 {
        ease_out_quad(self.progress)
    }
}

#[derive(Component, Debug, Clone)]
pub struct AmbientFlame {
    pub envelope: GrowthEnvelope,
    /// Value fed to the shader's `time` uniform.
    pub shader_time: f32,
    pub speed_factor: f32,
    pub growth_speed_factor: f32,
    pub scale: f32,
}

impl AmbientFlame {
    pub fn new(settings: &AmbientFlameSettings) -> Self {
        Self {
            envelope: GrowthEnvelope::default(),
            shader_time: 0.0,
            speed_factor: settings.speed_factor,
            growth_speed_factor: settings.growth_speed_factor,
            scale: settings.scale,
        }
    }

    /// One frame: the shader clock always runs, growth only after the first
    /// render.
    pub fn tick(&mut self, dt: f32, rendered: bool) {
        self.shader_time += dt * self.speed_factor;
        if rendered {
            self.envelope.mark_rendered();
        }
        self.envelope.advance(dt * self.growth_speed_factor);
    }

    pub fn current_scale(&self) -> f32 {
        self.scale * self.envelope.scale_factor()
    }
}

pub fn update_ambient_flames(
    time: Res<Time>,
    mut flames: Query<(
        &mut AmbientFlame,
        &mut Transform,
        &ViewVisibility,
        &MeshMaterial3d<FlameMaterial>,
    )>,
    mut materials: ResMut<Assets<FlameMaterial>>,
) {
    let dt = time.delta_secs();

    for (mut flame, mut transform, view_visibility, material) in &mut flames {
        let was_ready = flame.envelope.is_ready();
        flame.tick(dt, view_visibility.get());
        if !was_ready && flame.envelope.is_ready() {
            debug!("Ambient flame drawn, growing");
        }

        transform.scale = Vec3::splat(flame.current_scale().max(MIN_RENDER_SCALE));
        if let Some(material) = materials.get_mut(&material.0) {
            material.params.time = flame.shader_time;
        }
    }
}
