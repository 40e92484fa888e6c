use super::{PoseSample, PoseSampler};
use bevy::math::{Quat, Vec3};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoseTrackError {
    #[error("failed to read pose track: {0}")]
    Read(std::io::Error),
    #[error("failed to decode pose track JSON: {0}")]
    Decode(serde_json::Error),
    #[error("pose track has no keyframes")]
    Empty,
    #[error("pose track keyframe {index} at t={time} is earlier than the one before it")]
    UnorderedKeyframes { index: usize, time: f32 },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PoseKeyframe {
    pub time: f32,
    pub detected: bool,
    #[serde(default)]
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

#[derive(Deserialize, Debug, Clone)]
struct PoseTrackFile {
    #[serde(default)]
    looping: bool,
    keyframes: Vec<PoseKeyframe>,
}

/// Recorded or hand-written pose sequence, replayed against the app clock.
///
/// Between keyframes position is interpolated linearly and rotation with
/// slerp; the detection flag is held from the earlier keyframe.
#[derive(Debug, Clone)]
pub struct ScriptedPoseTrack {
    keyframes: Vec<PoseKeyframe>,
    looping: bool,
}

impl ScriptedPoseTrack {
    pub fn new(keyframes: Vec<PoseKeyframe>, looping: bool) -> Result<Self, PoseTrackError> {
        if keyframes.is_empty() {
            return Err(PoseTrackError::Empty);
        }
        for (index, pair) in keyframes.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(PoseTrackError::UnorderedKeyframes {
                    index: index + 1,
                    time: pair[1].time,
                });
            }
        }
        Ok(Self { keyframes, looping })
    }

    /// Object detected from the first frame on, held in front of the camera.
    pub fn steady() -> Self {
        Self {
            keyframes: vec![PoseKeyframe {
                time: 0.0,
                detected: true,
                position: [0.0, 0.0, -1.0],
                rotation: identity_rotation(),
            }],
            looping: false,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, PoseTrackError> {
        let file: PoseTrackFile = serde_json::from_str(raw).map_err(PoseTrackError::Decode)?;
        Self::new(file.keyframes, file.looping)
    }

    pub fn load(path: &Path) -> Result<Self, PoseTrackError> {
        let raw = fs::read_to_string(path).map_err(PoseTrackError::Read)?;
        Self::from_json(&raw)
    }

    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    fn local_time(&self, elapsed_secs: f32) -> f32 {
        let duration = self.duration();
        if self.looping && duration > 0.0 {
            elapsed_secs.rem_euclid(duration)
        } else {
            elapsed_secs
        }
    }

    pub fn sample_at(&self, elapsed_secs: f32) -> PoseSample {
        let t = self.local_time(elapsed_secs);
        let next_index = self.keyframes.partition_point(|k| k.time <= t);

        if next_index == 0 {
            return keyframe_sample(&self.keyframes[0]);
        }
        let current = &self.keyframes[next_index - 1];
        let Some(next) = self.keyframes.get(next_index) else {
            return keyframe_sample(current);
        };

        let span = next.time - current.time;
        let blend = if span > 0.0 {
            ((t - current.time) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let from = keyframe_sample(current);
        let to = keyframe_sample(next);
        PoseSample {
            detected: current.detected,
            position: from.position.lerp(to.position, blend),
            rotation: from.rotation.slerp(to.rotation, blend),
        }
    }
}

fn keyframe_sample(keyframe: &PoseKeyframe) -> PoseSample {
    let rotation = Quat::from_array(keyframe.rotation);
    PoseSample {
        detected: keyframe.detected,
        position: Vec3::from_array(keyframe.position),
        rotation: if rotation.length_squared() > f32::EPSILON {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        },
    }
}

impl PoseSampler for ScriptedPoseTrack {
    fn sample(&mut self, elapsed_secs: f32) -> PoseSample {
        self.sample_at(elapsed_secs)
    }
}
