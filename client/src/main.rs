use bevy::prelude::AppExit;

fn main() -> AppExit {
    dragon_ar::app::bootstrap::run_client_app()
}
