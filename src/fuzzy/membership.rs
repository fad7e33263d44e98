//! Piecewise-linear membership functions

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FuzzyResult};
use crate::fuzzy_ensure;

/// Membership function shapes
///
/// Both shapes are zero outside their support `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum MembershipFunction {
    /// Trapezoidal: ramps up on `[min, flat_start)`, is 1 on
    /// `[flat_start, flat_end]`, ramps down on `(flat_end, max]`
    Trapezoid {
        min: f64,
        max: f64,
        flat_start: f64,
        flat_end: f64,
    },
    /// Triangular: exactly 1 only at `peak`
    Triangular { min: f64, peak: f64, max: f64 },
}

impl MembershipFunction {
    /// Trapezoid in `(min, max, flat_start, flat_end)` parameter order
    pub fn trapezoid(min: f64, max: f64, flat_start: f64, flat_end: f64) -> Self {
        MembershipFunction::Trapezoid {
            min,
            max,
            flat_start,
            flat_end,
        }
    }

    pub fn triangular(min: f64, peak: f64, max: f64) -> Self {
        MembershipFunction::Triangular { min, peak, max }
    }

    /// Evaluate membership for a crisp value
    pub fn evaluate(&self, x: f64) -> f64 {
        let (min, max, flat_start, flat_end) = self.corners();

        let degree = if x < min || x > max {
            0.0
        } else if x < flat_start {
            // strict comparison: a flat left edge (flat_start == min) never divides by zero
            (x - min) / (flat_start - min)
        } else if x > flat_end {
            (x - max) / (flat_end - max)
        } else {
            1.0
        };

        degree.clamp(0.0, 1.0)
    }

    /// `(min, max, flat_start, flat_end)`; a triangle has a zero-width plateau
    pub fn corners(&self) -> (f64, f64, f64, f64) {
        match *self {
            MembershipFunction::Trapezoid {
                min,
                max,
                flat_start,
                flat_end,
            } => (min, max, flat_start, flat_end),
            MembershipFunction::Triangular { min, peak, max } => (min, max, peak, peak),
        }
    }

    /// Get the support (where membership may be > 0)
    pub fn support(&self) -> (f64, f64) {
        let (min, max, _, _) = self.corners();
        (min, max)
    }

    /// Get the core (where membership = 1)
    pub fn core(&self) -> (f64, f64) {
        let (_, _, flat_start, flat_end) = self.corners();
        (flat_start, flat_end)
    }

    /// Shape tag as used in system descriptions
    pub fn kind(&self) -> &'static str {
        match self {
            MembershipFunction::Trapezoid { .. } => "trapezoid",
            MembershipFunction::Triangular { .. } => "triangular",
        }
    }

    /// Check that parameters are finite and ordered
    pub fn validate(&self) -> FuzzyResult<()> {
        let (min, max, flat_start, flat_end) = self.corners();
        fuzzy_ensure!(
            [min, max, flat_start, flat_end].iter().all(|v| v.is_finite()),
            ErrorCode::InvalidShape,
            "{} parameters must be finite: {:?}",
            self.kind(),
            self
        );
        fuzzy_ensure!(
            min <= flat_start && flat_start <= flat_end && flat_end <= max,
            ErrorCode::InvalidShape,
            "{} parameters are not ordered: {:?}",
            self.kind(),
            self
        );
        Ok(())
    }
}
