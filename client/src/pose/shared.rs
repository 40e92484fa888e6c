use super::{PoseSample, PoseSampler};
use std::sync::{Arc, Mutex, PoisonError};

/// Latest-value slot an external detector can push poses into from any
/// thread. The render loop reads whatever was pushed last.
#[derive(Clone, Default)]
pub struct SharedPoseSampler {
    latest: Arc<Mutex<PoseSample>>,
}

impl SharedPoseSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, sample: PoseSample) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = sample;
    }

    pub fn mark_lost(&self) {
        self.push(PoseSample::LOST);
    }
}

impl PoseSampler for SharedPoseSampler {
    fn sample(&mut self, _elapsed_secs: f32) -> PoseSample {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
