use serde::{Deserialize, Serialize};

use super::state::{TargetSite, VehicleState};

// ---------------------------------------------------------------------------
// Observation vector handed to the policy each tick
// ---------------------------------------------------------------------------

pub const OBSERVATION_LEN: usize = 10;

/// Fixed-layout observation:
/// `[altitude, dx, dz, vx, vy, vz, pitch, yaw, wx, wz]`
/// where `dx`/`dz` are position minus target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub altitude: f64,
    pub target_dx: f64,
    pub target_dz: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub wx: f64,
    pub wz: f64,
}

impl Observation {
    /// Altitude is passed through raw, sentinel included; the policy sees
    /// the same value the state machine does.
    pub fn encode(state: &VehicleState, target: &TargetSite) -> Self {
        let d = target.offset_of(state);
        Self {
            altitude: state.position.y,
            target_dx: d.x,
            target_dz: d.y,
            vx: state.velocity.x,
            vy: state.velocity.y,
            vz: state.velocity.z,
            pitch: state.attitude.pitch(),
            yaw: state.attitude.yaw(),
            wx: state.angular_velocity.x,
            wz: state.angular_velocity.z,
        }
    }

    pub fn to_array(&self) -> [f64; OBSERVATION_LEN] {
        [
            self.altitude,
            self.target_dx,
            self.target_dz,
            self.vx,
            self.vy,
            self.vz,
            self.pitch,
            self.yaw,
            self.wx,
            self.wz,
        ]
    }
}
