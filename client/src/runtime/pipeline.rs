use bevy::prelude::*;

/// Per-frame order: pose intake, creature timeline, effect composition,
/// effect simulation, overlay sync.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ArPipelineSet {
    AssetLoad,
    Pose,
    Creature,
    Compose,
    Effects,
    UiSync,
}
