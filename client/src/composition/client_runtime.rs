use bevy::prelude::*;
use bevy::state::app::AppExtStates;
use bevy_egui::EguiPlugin;

use crate::AppState;
use crate::app::plugins::build_bevy_plugins;
use crate::runtime::registration::register_ar_runtime;
use crate::settings::{ArSettings, SettingsResource};

pub fn configure_client_app(app: &mut App, startup_settings: &ArSettings) {
    app.insert_resource(SettingsResource::new(startup_settings.clone()))
        .add_plugins(build_bevy_plugins(startup_settings))
        .add_plugins(EguiPlugin::default())
        .init_state::<AppState>();

    register_ar_runtime(app);
}
