//! Pose-anchored AR creature: a dragon flies in along a curved path, breathes
//! fire and settles next to a flame, all locked to a tracked object's pose.

pub mod anchor;
pub mod app;
pub mod composer;
pub mod composition;
pub mod creature;
pub mod effects;
pub mod pose;
pub mod runtime;
pub mod settings;
pub mod stage;
pub mod ui;

pub use app::state::AppState;
