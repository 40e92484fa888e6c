//! Intake of the tracked object's pose.
//!
//! Detection and stabilisation happen outside this crate. Whatever produces
//! poses implements [`PoseSampler`]; once per frame the runtime asks it for
//! the latest [`PoseSample`] and publishes detection transitions.

pub mod shared;
pub mod track;

use bevy::prelude::*;
use std::path::Path;

use crate::app::plugins::CLIENT_ASSETS_ROOT;
use crate::settings::SettingsResource;

pub use shared::SharedPoseSampler;
pub use track::{PoseKeyframe, PoseTrackError, ScriptedPoseTrack};

/// Detection result for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub detected: bool,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PoseSample {
    pub const LOST: Self = Self {
        detected: false,
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn detected(position: Vec3, rotation: Quat) -> Self {
        Self {
            detected: true,
            position,
            rotation,
        }
    }

    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation)
    }
}

impl Default for PoseSample {
    fn default() -> Self {
        Self::LOST
    }
}

/// Source of per-frame poses. Implementations are expected to return
/// already-smoothed values.
pub trait PoseSampler: Send + Sync + 'static {
    fn sample(&mut self, elapsed_secs: f32) -> PoseSample;
}

/// The active pose source.
#[derive(Resource)]
pub struct PoseSource(pub Box<dyn PoseSampler>);

impl PoseSource {
    pub fn new(sampler: impl PoseSampler) -> Self {
        Self(Box::new(sampler))
    }
}

/// Pose sampled this frame.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct CurrentPose(pub PoseSample);

/// Detection lifecycle derived from consecutive samples.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionState {
    pub detected: bool,
    pub ever_detected: bool,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionChanged {
    Detected,
    Lost,
}

impl DetectionState {
    /// Folds a new detection flag in, returning the transition if any.
    pub fn observe(&mut self, detected: bool) -> Option<DetectionChanged> {
        if detected == self.detected {
            return None;
        }
        self.detected = detected;
        if detected {
            self.ever_detected = true;
            Some(DetectionChanged::Detected)
        } else {
            Some(DetectionChanged::Lost)
        }
    }
}

/// Installs the configured pose track unless a source was provided up front,
/// e.g. a [`SharedPoseSampler`] fed by an external detector.
pub fn install_pose_source(
    mut commands: Commands,
    settings: Res<SettingsResource>,
    existing: Option<Res<PoseSource>>,
) {
    if existing.is_some() {
        return;
    }

    let sampler = match &settings.current.pose.track {
        Some(track) => {
            let path = Path::new(CLIENT_ASSETS_ROOT).join(track);
            match ScriptedPoseTrack::load(&path) {
                Ok(sampler) => {
                    info!(
                        "Replaying pose track '{}' ({:.1}s)",
                        path.display(),
                        sampler.duration()
                    );
                    sampler
                }
                Err(error) => {
                    error!(
                        "Failed to load pose track '{}': {}. Holding a steady pose instead.",
                        path.display(),
                        error
                    );
                    ScriptedPoseTrack::steady()
                }
            }
        }
        None => ScriptedPoseTrack::steady(),
    };
    commands.insert_resource(PoseSource::new(sampler));
}

pub fn sample_pose(time: Res<Time>, mut source: ResMut<PoseSource>, mut pose: ResMut<CurrentPose>) {
    pose.0 = source.0.sample(time.elapsed_secs());
}

pub fn track_detection(
    pose: Res<CurrentPose>,
    mut detection: ResMut<DetectionState>,
    mut changes: MessageWriter<DetectionChanged>,
) {
    let Some(change) = detection.observe(pose.0.detected) else {
        return;
    };

    match change {
        DetectionChanged::Detected => info!("Tracked object detected"),
        DetectionChanged::Lost => info!("Tracked object lost"),
    }
    changes.write(change);
}

/// Run condition: the tracked object is currently detected.
pub fn object_detected(detection: Res<DetectionState>) -> bool {
    detection.detected
}
