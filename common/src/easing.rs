/// Quadratic ease-out: fast start, gentle landing.
///
/// Input is expected in `[0, 1]`; `0` maps to `0` and `1` maps to `1`.
pub fn ease_out_quad(x: f32) -> f32 {
    1.0 - (1.0 - x) * (1.0 - x)
}
