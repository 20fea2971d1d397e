//! Turning iteration counts into paint.  A two-color linear gradient:
//! points that never escape get the start color verbatim, and escaping
//! points are placed along the ramp by how long they held out.
use num;

use escape::IterationResult;

/// One sRGB color, eight bits per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Constructor, in the order the channels are written everywhere.
    pub fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// The channels as the three bytes an RGB image buffer wants.
    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// A linear ramp between two colors, indexed by normalized escape
/// time.  The ramp may run in any direction per channel; descending
/// gradients are as good as ascending ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorGradient {
    /// Color of points that never escape, and of the fastest escapes
    /// in the limit.
    pub start: Rgb,
    /// Color reached by points that escape exactly at the cap.
    pub end: Rgb,
}

impl ColorGradient {
    /// Constructor.
    pub fn new(start: Rgb, end: Rgb) -> ColorGradient {
        ColorGradient { start, end }
    }

    /// The color for one orbit's outcome under a given iteration cap.
    /// Trapped orbits take the start color exactly.  Escaped orbits
    /// are shaded at `count / cap` along the ramp, so an orbit that
    /// escapes at the cap lands exactly on the end color.
    pub fn shade(&self, result: IterationResult, cap: usize) -> Rgb {
        if !result.escaped {
            return self.start;
        }
        let t = (result.count as f64) / (cap as f64);
        Rgb {
            r: lerp_channel(self.start.r, self.end.r, t),
            g: lerp_channel(self.start.g, self.end.g, t),
            b: lerp_channel(self.start.b, self.end.b, t),
        }
    }
}

// Round-to-nearest with halves away from zero, then clamp to the
// channel range.
fn lerp_channel(start: u8, end: u8, t: f64) -> u8 {
    let value = (start as f64) + t * ((end as f64) - (start as f64));
    num::clamp(value.round(), 0.0, 255.0) as u8
}
