//! The escape-time kernel.  One pixel's worth of work: seed the orbit
//! at zero, apply the formula until the value leaves the escape circle
//! or the iteration cap runs out, and report which happened first.
use num::Complex;

use expr::FractalFunction;

/// Radius of the escape circle.  An orbit that gets farther than this
/// from the origin is gone for good, so iteration stops there.
pub const ESCAPE_RADIUS: f64 = 2.0;

// Compared against norm_sqr to spare a square root per step.
const ESCAPE_RADIUS_SQUARED: f64 = ESCAPE_RADIUS * ESCAPE_RADIUS;

/// What happened to one orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationResult {
    /// How many applications of the formula were performed.  For an
    /// escaped orbit this is the step at which it left the circle; for
    /// a trapped one it equals the iteration cap.
    pub count: usize,
    /// True if the orbit left the escape circle, false if it was still
    /// inside when the cap ran out.
    pub escaped: bool,
}

/// Iterate the formula from `z = 0` for the seed point `c`.
///
/// Escape means *strictly* outside the circle: an orbit sitting
/// exactly on the radius keeps going.  A non-finite value, from
/// division by zero or an overflowed exponential, counts as escaping
/// at the step that produced it; the orbit is certainly not coming
/// back from infinity.  The caller guarantees `cap` is at least 1.
pub fn escape_time(function: &FractalFunction, c: Complex<f64>, cap: usize) -> IterationResult {
    let mut z = Complex::new(0.0, 0.0);
    for step in 1..=cap {
        z = function.eval(z, c);
        if !z.re.is_finite() || !z.im.is_finite() {
            return IterationResult {
                count: step,
                escaped: true,
            };
        }
        if z.norm_sqr() > ESCAPE_RADIUS_SQUARED {
            return IterationResult {
                count: step,
                escaped: true,
            };
        }
    }
    IterationResult {
        count: cap,
        escaped: false,
    }
}
