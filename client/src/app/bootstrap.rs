use bevy::prelude::{App, AppExit};

use crate::composition::client_runtime::configure_client_app;
use crate::settings;

pub fn run_client_app() -> AppExit {
    let startup_settings = settings::load_settings_or_default();
    let mut app = App::new();
    configure_client_app(&mut app, &startup_settings);
    app.run()
}
