/// Phases of the creature's performance.
///
/// Progression is strictly `Arriving -> Attacking -> Idle`; only a reset
/// brings the creature back to `Arriving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationPhase {
    /// Flying in along the flight path.
    #[default]
    Arriving,
    /// Playing the attack clip; drives the breath and ambient flame windows.
    Attacking,
    /// Looping the fly clip until the next reset.
    Idle,
}

impl AnimationPhase {
    pub fn name(&self) -> &'static str {
        match self {
            AnimationPhase::Arriving => "Arriving",
            AnimationPhase::Attacking => "Attacking",
            AnimationPhase::Idle => "Idle",
        }
    }
}

impl std::fmt::Display for AnimationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
