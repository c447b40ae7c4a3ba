use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sensor constants
// ---------------------------------------------------------------------------

/// Altitude reported by the downward ray when no ground is found within range.
pub const ALTITUDE_UNSENSED: f64 = -1.0;

// ---------------------------------------------------------------------------
// Attitude: wrapped Euler angles in degrees
// ---------------------------------------------------------------------------

/// Wrap an angle in degrees into (-180, 180].
pub fn wrap_degrees(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    if w > 180.0 {
        w - 360.0
    } else {
        w
    }
}

/// Euler attitude, each axis in degrees and normalized to (-180, 180].
///
/// Axis naming follows the lander body frame: pitch about X, roll about Y
/// (the thrust axis), yaw about Z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAttitude")]
pub struct Attitude {
    pitch: f64,
    roll: f64,
    yaw: f64,
}

/// Wire form of [`Attitude`]; deserialized angles are wrapped like any
/// other input.
#[derive(Deserialize)]
struct RawAttitude {
    pitch: f64,
    roll: f64,
    yaw: f64,
}

impl From<RawAttitude> for Attitude {
    fn from(raw: RawAttitude) -> Self {
        Self::from_degrees(raw.pitch, raw.roll, raw.yaw)
    }
}

impl Attitude {
    /// Build from raw engine Euler angles (any range, e.g. [0, 360)).
    pub fn from_degrees(pitch: f64, roll: f64, yaw: f64) -> Self {
        Self {
            pitch: wrap_degrees(pitch),
            roll: wrap_degrees(roll),
            yaw: wrap_degrees(yaw),
        }
    }

    pub fn level() -> Self {
        Self::default()
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn roll(&self) -> f64 {
        self.roll
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    /// True when both |pitch| and |yaw| are strictly below `limit_deg`.
    pub fn within(&self, limit_deg: f64) -> bool {
        self.pitch.abs() < limit_deg && self.yaw.abs() < limit_deg
    }

    /// True when both |pitch| and |yaw| strictly exceed `limit_deg`.
    pub fn both_exceed(&self, limit_deg: f64) -> bool {
        self.pitch.abs() > limit_deg && self.yaw.abs() > limit_deg
    }
}

// ---------------------------------------------------------------------------
// Vehicle state, as sensed once per tick
// ---------------------------------------------------------------------------

/// Kinematic state supplied by the physics collaborator each tick.
/// Frame: X/Z horizontal, Y up. `position.y` is the ray-sensed altitude,
/// not the world height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Vector3<f64>,         // [x, altitude, z]
    pub velocity: Vector3<f64>,         // units/s
    pub attitude: Attitude,
    pub angular_velocity: Vector3<f64>, // rad/s, body frame
    pub settled: bool,                  // engine rest detection
}

impl VehicleState {
    /// Vehicle at rest in level attitude at the given position.
    pub fn at(position: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            attitude: Attitude::level(),
            angular_velocity: Vector3::zeros(),
            settled: false,
        }
    }

    /// Sensed altitude, or `None` when the ray found no ground.
    pub fn altitude(&self) -> Option<f64> {
        if self.position.y < 0.0 {
            None
        } else {
            Some(self.position.y)
        }
    }

    pub fn horizontal(&self) -> Vector2<f64> {
        Vector2::new(self.position.x, self.position.z)
    }

    pub fn horizontal_velocity(&self) -> Vector2<f64> {
        Vector2::new(self.velocity.x, self.velocity.z)
    }
}

// ---------------------------------------------------------------------------
// Landing target
// ---------------------------------------------------------------------------

/// Horizontal landing goal, fixed for the duration of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSite {
    pub x: f64,
    pub z: f64,
}

impl TargetSite {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.z)
    }

    /// Position minus target on both horizontal axes.
    pub fn offset_of(&self, state: &VehicleState) -> Vector2<f64> {
        state.horizontal() - self.as_vector()
    }

    pub fn distance_to(&self, state: &VehicleState) -> f64 {
        self.offset_of(state).norm()
    }
}

// ---------------------------------------------------------------------------
// Contact events
// ---------------------------------------------------------------------------

/// A collision contact reported by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// Vertical component of the relative velocity at contact (positive = closing).
    pub closing_speed: f64,
}

impl ContactEvent {
    pub fn new(closing_speed: f64) -> Self {
        Self { closing_speed }
    }
}
