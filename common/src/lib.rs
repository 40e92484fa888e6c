//! Engine-free building blocks for the dragon AR client.
//!
//! Everything here is plain data and arithmetic: the creature's animation
//! phases, clamped phase progress, validated frame time, edge-triggered
//! booleans and the easing curve shared by the flight path and the flame
//! growth envelope. The client crate wires these into Bevy systems.

pub mod easing;
pub mod phase;
pub mod progress;
pub mod signal;

pub use easing::ease_out_quad;
pub use phase::AnimationPhase;
pub use progress::{FrameDelta, PhaseProgress};
pub use signal::{Edge, EdgeSignal};
