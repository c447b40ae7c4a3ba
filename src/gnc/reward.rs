use serde::{Deserialize, Serialize};

use super::guidance::{DescentProfile, LateralProfile};
use crate::dynamics::state::{TargetSite, VehicleState};

/// Every individual term is clamped into this range.
pub const TERM_MIN: f64 = -10.0;
pub const TERM_MAX: f64 = 1.0;

// ---------------------------------------------------------------------------
// Penalty curve
// ---------------------------------------------------------------------------

/// `peak - amplitude * |tanh(gain * deviation)|`: `peak` at zero deviation,
/// saturating toward `peak - amplitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturatingPenalty {
    pub gain: f64,
    pub amplitude: f64,
    pub peak: f64,
}

impl SaturatingPenalty {
    pub const fn new(gain: f64, amplitude: f64, peak: f64) -> Self {
        Self { gain, amplitude, peak }
    }

    pub fn score(&self, deviation: f64) -> f64 {
        self.peak - self.amplitude * (self.gain * deviation).tanh().abs()
    }
}

/// Vertical term override while the vehicle is climbing or hovering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AscentGuard {
    /// Vertical velocity above which the guard fires.
    pub above: f64,
    pub penalty: f64,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardCoefficients {
    /// Episode length the step penalty is spread over; 0 disables it.
    pub max_episode_steps: u32,
    pub step_penalty: f64,

    pub descent: DescentProfile,
    pub vertical: SaturatingPenalty,
    /// Deviation beyond which further vertical penalty is scaled by
    /// `attenuation`.
    pub attenuation_threshold: f64,
    pub attenuation: f64,
    pub ascent_guard: Option<AscentGuard>,

    pub attitude: SaturatingPenalty,
    /// At or below this altitude attitude terms can only penalize.
    pub attitude_floor_altitude: f64,

    /// `None` disables the horizontal terms.
    pub lateral: Option<LateralProfile>,
    pub horizontal: SaturatingPenalty,
}

impl Default for RewardCoefficients {
    fn default() -> Self {
        Self::precision_landing()
    }
}

impl RewardCoefficients {
    /// Targeted descent from ~500 u: two-segment profile, lateral closure,
    /// ascent guard.
    pub fn precision_landing() -> Self {
        Self {
            max_episode_steps: 5_000,
            step_penalty: 2.0,
            descent: DescentProfile::default(),
            vertical: SaturatingPenalty::new(0.1, 2.0, 1.0),
            attenuation_threshold: 10.0,
            attenuation: 0.2,
            ascent_guard: Some(AscentGuard {
                above: -0.5,
                penalty: -1.0,
            }),
            attitude: SaturatingPenalty::new(0.1, 2.0, 1.0),
            attitude_floor_altitude: 2.0,
            lateral: Some(LateralProfile::default()),
            horizontal: SaturatingPenalty::new(0.5, 2.0, 1.0),
        }
    }

    /// Untargeted hover-and-settle from ~100 u.
    pub fn basic_descent() -> Self {
        Self {
            max_episode_steps: 5_000,
            step_penalty: 1.0,
            descent: DescentProfile::basic(),
            vertical: SaturatingPenalty::new(0.5, 2.0, 1.0),
            attenuation_threshold: 10.0,
            attenuation: 1.0,
            ascent_guard: None,
            attitude: SaturatingPenalty::new(0.05, 1.0, 0.5),
            attitude_floor_altitude: 0.0,
            lateral: None,
            horizontal: SaturatingPenalty::new(0.5, 2.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-tick breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardTerms {
    pub step: f64,
    pub vertical: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub horizontal_x: f64,
    pub horizontal_z: f64,
}

impl RewardTerms {
    pub fn attitude(&self) -> f64 {
        self.pitch + self.yaw
    }

    pub fn horizontal(&self) -> f64 {
        self.horizontal_x + self.horizontal_z
    }

    pub fn total(&self) -> f64 {
        self.step + self.vertical + self.attitude() + self.horizontal()
    }
}

// ---------------------------------------------------------------------------
// RewardShaper
// ---------------------------------------------------------------------------

/// Stateless per-tick reward from vehicle kinematics and the landing target.
#[derive(Debug, Clone, Default)]
pub struct RewardShaper {
    coeffs: RewardCoefficients,
}

impl RewardShaper {
    pub fn new(coeffs: RewardCoefficients) -> Self {
        Self { coeffs }
    }

    pub fn coefficients(&self) -> &RewardCoefficients {
        &self.coeffs
    }

    pub fn shape(&self, state: &VehicleState, target: &TargetSite) -> RewardTerms {
        let c = &self.coeffs;
        let altitude = state.altitude().unwrap_or(0.0);

        let vertical = match c.ascent_guard {
            Some(guard) if state.velocity.y > guard.above => bounded(guard.penalty),
            _ => self.vertical_velocity_term(
                state.velocity.y,
                c.descent.reference_velocity(altitude),
            ),
        };

        let (horizontal_x, horizontal_z) = match c.lateral {
            Some(lateral) => {
                let offset = target.offset_of(state);
                let v = state.horizontal_velocity();
                (
                    self.horizontal_term(v.x, lateral.closure_velocity(offset.x)),
                    self.horizontal_term(v.y, lateral.closure_velocity(offset.y)),
                )
            }
            None => (0.0, 0.0),
        };

        RewardTerms {
            step: self.step_term(),
            vertical,
            pitch: self.attitude_term(state.attitude.pitch(), altitude),
            yaw: self.attitude_term(state.attitude.yaw(), altitude),
            horizontal_x,
            horizontal_z,
        }
    }

    pub fn step_term(&self) -> f64 {
        let c = &self.coeffs;
        if c.max_episode_steps == 0 {
            return 0.0;
        }
        bounded(-c.step_penalty / f64::from(c.max_episode_steps))
    }

    /// Peak at zero deviation, strictly decreasing in `|reference - actual|`.
    /// Past the threshold only `attenuation` of the additional penalty is
    /// applied, so the curve stays continuous.
    ///
    /// The decrease is strict only while `tanh(gain * d)` is representably
    /// below 1; once `gain * d` reaches about 19 the f64 tanh rounds to 1 and
    /// the term sits on its floor
    /// `at + attenuation * (peak - amplitude - at)`.
    pub fn vertical_velocity_term(&self, actual: f64, reference: f64) -> f64 {
        let c = &self.coeffs;
        let d = (reference - actual).abs();
        let raw = c.vertical.score(d);
        let r = if d > c.attenuation_threshold {
            let at = c.vertical.score(c.attenuation_threshold);
            at + c.attenuation * (raw - at)
        } else {
            raw
        };
        bounded(r)
    }

    /// Tilt in degrees. At or below the floor altitude the term is capped
    /// at zero.
    pub fn attitude_term(&self, tilt_deg: f64, altitude: f64) -> f64 {
        let c = &self.coeffs;
        let r = c.attitude.score(tilt_deg.abs());
        if altitude > c.attitude_floor_altitude {
            bounded(r)
        } else {
            bounded(r.min(0.0))
        }
    }

    pub fn horizontal_term(&self, actual: f64, reference: f64) -> f64 {
        bounded(self.coeffs.horizontal.score(reference - actual))
    }
}

fn bounded(r: f64) -> f64 {
    r.clamp(TERM_MIN, TERM_MAX)
}
