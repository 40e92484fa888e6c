pub mod bootstrap;
pub mod plugins;
pub mod state;
