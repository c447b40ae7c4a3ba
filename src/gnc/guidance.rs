use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Guidance: reference velocities the shaper and autopilot track
// ---------------------------------------------------------------------------

/// `rate * altitude + shift` exponent of one profile segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpSegment {
    pub rate: f64,
    pub shift: f64,
}

/// Segment used above `above` units of altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighSegment {
    pub above: f64,
    pub segment: ExpSegment,
}

/// Vertical reference velocity as a function of sensed altitude:
///
/// `v_ref(h) = -amplitude * exp(rate * h + shift) + offset`
///
/// Negative is descending. As `h -> 0` the magnitude shrinks toward
/// `amplitude * exp(shift) - offset`, the touchdown speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescentProfile {
    pub amplitude: f64,
    pub offset: f64,
    pub low: ExpSegment,
    pub high: Option<HighSegment>,
}

impl Default for DescentProfile {
    /// Two-segment profile: ~18 u/s at the 200 u breakpoint, ~0.7 u/s at
    /// touchdown, continuous at the breakpoint.
    fn default() -> Self {
        Self {
            amplitude: 20.0,
            offset: 2.0,
            low: ExpSegment { rate: 0.01, shift: -2.0 },
            high: Some(HighSegment {
                above: 200.0,
                segment: ExpSegment { rate: 0.001, shift: -0.2 },
            }),
        }
    }
}

impl DescentProfile {
    /// Single-segment profile `-2 exp(h / 100) + 1`.
    pub fn basic() -> Self {
        Self {
            amplitude: 2.0,
            offset: 1.0,
            low: ExpSegment { rate: 0.01, shift: 0.0 },
            high: None,
        }
    }

    pub fn reference_velocity(&self, altitude: f64) -> f64 {
        let h = altitude.max(0.0);
        let seg = match self.high {
            Some(high) if h > high.above => high.segment,
            _ => self.low,
        };
        -self.amplitude * (seg.rate * h + seg.shift).exp() + self.offset
    }

    /// Reference speed at zero altitude.
    pub fn touchdown_speed(&self) -> f64 {
        self.reference_velocity(0.0).abs()
    }
}

/// Lateral closure velocity toward the target on one horizontal axis:
/// `v_ref(d) = -max_speed * tanh(scale * d)` with `d = position - target`.
/// Always points at the target and grows slower than linearly with distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LateralProfile {
    pub max_speed: f64,
    pub scale: f64,
}

impl Default for LateralProfile {
    fn default() -> Self {
        Self {
            max_speed: 50.0,
            scale: 0.002,
        }
    }
}

impl LateralProfile {
    pub fn closure_velocity(&self, offset: f64) -> f64 {
        -self.max_speed * (self.scale * offset).tanh()
    }
}
