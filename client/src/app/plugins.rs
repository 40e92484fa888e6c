use bevy::app::PluginGroupBuilder;
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::render::pipelined_rendering::PipelinedRenderingPlugin;
use bevy::window::WindowResolution;

use crate::settings::ArSettings;

pub const CLIENT_ASSETS_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../assets");

pub fn build_bevy_plugins(startup_settings: &ArSettings) -> PluginGroupBuilder {
    DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(create_window_settings(startup_settings)),
            ..Default::default()
        })
        .set(AssetPlugin {
            file_path: CLIENT_ASSETS_ROOT.into(),
            ..Default::default()
        })
        .disable::<PipelinedRenderingPlugin>()
}

fn create_window_settings(startup_settings: &ArSettings) -> Window {
    let window = &startup_settings.window;
    Window {
        title: window.title.clone(),
        resolution: WindowResolution::new(window.width, window.height),
        resizable: true,
        ..Default::default()
    }
}
