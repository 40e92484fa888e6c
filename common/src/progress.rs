/// Elapsed frame time in seconds, guaranteed finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FrameDelta(f32);

impl FrameDelta {
    pub const ZERO: Self = Self(0.0);

    /// Returns `None` for negative or non-finite input.
    pub fn new(seconds: f32) -> Option<Self> {
        if seconds.is_finite() && seconds >= 0.0 {
            Some(Self(seconds))
        } else {
            None
        }
    }

    /// Like [`FrameDelta::new`], but invalid input becomes zero elapsed time.
    pub fn clamped(seconds: f32) -> Self {
        Self::new(seconds).unwrap_or(Self::ZERO)
    }

    pub fn seconds(self) -> f32 {
        self.0
    }
}

/// Normalised completion of one phase, always within `[0, 1]`.
///
/// Progress only moves forward: `advanced` computes
/// `min(1, previous + delta / duration)`, so a valid [`FrameDelta`] can never
/// make it decrease.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct PhaseProgress(f32);

impl PhaseProgress {
    pub const START: Self = Self(0.0);
    pub const COMPLETE: Self = Self(1.0);

    /// Builds a progress value from a raw fraction, clamped into `[0, 1]`.
    /// NaN maps to the start.
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction.is_nan() {
            Self::START
        } else {
            Self(fraction.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Advances by `delta / duration`. A phase with no usable duration
    /// (zero, negative or non-finite) completes immediately.
    pub fn advanced(self, delta: FrameDelta, duration: f32) -> Self {
        if !(duration.is_finite() && duration > 0.0) {
            return Self::COMPLETE;
        }
        Self((self.0 + delta.seconds() / duration).min(1.0))
    }

    pub fn is_complete(self) -> bool {
        self.0 >= 1.0
    }

    /// Strictly greater than `threshold`; landing exactly on it does not count.
    pub fn exceeds(self, threshold: f32) -> bool {
        self.0 > threshold
    }

    /// Strictly inside the open interval `(start, stop)`.
    pub fn within_open(self, start: f32, stop: f32) -> bool {
        self.0 > start && self.0 < stop
    }
}
