use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderType};
use bevy::shader::ShaderRef;

/// Noise-displaced flame, blended additively. The shape and colour live in
/// `shaders/flame.wgsl`; the only input is the animation time.
#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
pub struct FlameMaterial {
    #[uniform(0)]
    pub params: FlameParams,
}

#[derive(ShaderType, Debug, Clone, Copy)]
pub struct FlameParams {
    pub time: f32,
    pub _padding: Vec3,
}

impl Default for FlameMaterial {
    fn default() -> Self {
        Self {
            params: FlameParams {
                time: 0.0,
                _padding: Vec3::ZERO,
            },
        }
    }
}

impl Material for FlameMaterial {
    fn vertex_shader() -> ShaderRef {
        "shaders/flame.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "shaders/flame.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Add
    }
}
