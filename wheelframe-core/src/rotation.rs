/// Smoothed two-axis rotation state
use nalgebra::Vector2;
use serde::Deserialize;

use crate::scene::RotationTarget;

/// Weight applied to the remaining distance on every frame
pub const DEFAULT_BLEND_FACTOR: f64 = 0.1;

/// A rotation field on the external model object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Which model axes receive the pitch and yaw angles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMapping {
    pub pitch: Axis,
    pub yaw: Axis,
}

impl Default for AxisMapping {
    fn default() -> Self {
        Self {
            pitch: Axis::X,
            yaw: Axis::Z,
        }
    }
}

/// A pitch/yaw pair. Units depend on context, degrees unless stated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Angles {
    /// Driven by vertical pointer position
    pub pitch: f64,
    /// Driven by horizontal pointer position
    pub yaw: f64,
}

impl Angles {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.pitch, self.yaw)
    }

    fn from_vector(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Current and target rotation in degrees.
///
/// `current` only moves through [`RotationState::step`]; `target` only
/// through [`RotationState::set_target`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    current: Vector2<f64>,
    target: Vector2<f64>,
}

impl RotationState {
    pub fn zero() -> Self {
        Self {
            current: Vector2::zeros(),
            target: Vector2::zeros(),
        }
    }

    pub fn current(&self) -> Angles {
        Angles::from_vector(self.current)
    }

    pub fn target(&self) -> Angles {
        Angles::from_vector(self.target)
    }

    /// Replace both target angles at once
    pub fn set_target(&mut self, target: Angles) {
        self.target = target.to_vector();
    }

    /// Move `current` toward `target` by `factor` of the remaining distance
    pub fn step(&mut self, factor: f64) {
        self.current = self.current.lerp(&self.target, factor);
    }

    /// Largest per-axis distance between current and target, in degrees
    pub fn remaining(&self) -> f64 {
        (self.target - self.current).amax()
    }

    pub fn converged(&self, tolerance: f64) -> bool {
        self.remaining() <= tolerance
    }

    pub fn reset(&mut self) {
        *self = Self::zero();
    }

    /// Current angles converted to radians
    pub fn current_radians(&self) -> Angles {
        Angles::from_vector(self.current.map(f64::to_radians))
    }

    /// Write the current angles onto a model
    pub fn apply<M: RotationTarget + ?Sized>(&self, mapping: AxisMapping, model: &mut M) {
        let radians = self.current_radians();
        model.set_rotation(mapping.pitch, radians.pitch);
        model.set_rotation(mapping.yaw, radians.yaw);
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Per-frame exponential smoothing toward the target rotation
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    factor: f64,
    mapping: AxisMapping,
}

impl Smoother {
    pub fn new(factor: f64, mapping: AxisMapping) -> Self {
        Self { factor, mapping }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn mapping(&self) -> AxisMapping {
        self.mapping
    }

    /// Advance one frame. Without a model the state is left untouched.
    pub fn tick<M: RotationTarget + ?Sized>(&self, state: &mut RotationState, model: Option<&mut M>) {
        let Some(model) = model else {
            return;
        };
        state.step(self.factor);
        state.apply(self.mapping, model);
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_BLEND_FACTOR, AxisMapping::default())
    }
}
