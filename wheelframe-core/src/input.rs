/// Pointer input to target rotation
use crate::rotation::Angles;

/// Full angular sweep across the viewport, in degrees (±20 around center)
pub const DEFAULT_SWEEP_DEGREES: f64 = 40.0;

/// Maps normalized pointer coordinates to target angles.
///
/// Local pointer events and parent `MOUSE_MOVE` messages both go through
/// [`Normalizer::target`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    sweep_degrees: f64,
    invert_yaw: bool,
}

impl Normalizer {
    pub fn new(sweep_degrees: f64, invert_yaw: bool) -> Self {
        Self {
            sweep_degrees,
            invert_yaw,
        }
    }

    /// Target angles for a position in [0,1]x[0,1].
    ///
    /// Out-of-range input is not clamped and simply yields a wider angle.
    pub fn target(&self, normalized_x: f64, normalized_y: f64) -> Angles {
        let sign = if self.invert_yaw { -1.0 } else { 1.0 };
        Angles::new(
            (normalized_y - 0.5) * self.sweep_degrees,
            sign * (normalized_x - 0.5) * self.sweep_degrees,
        )
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_DEGREES, true)
    }
}

/// Size of the widget's window in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Client coordinates as fractions of the viewport.
    ///
    /// Returns `None` for a degenerate viewport (zero, negative or NaN size).
    pub fn normalize(&self, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(self.width) || !usable(self.height) {
            return None;
        }
        Some((client_x / self.width, client_y / self.height))
    }
}
