use crate::dynamics::observation::Observation;
use super::actuator::{ActionTriple, AxisCommand, ThrusterCommand};
use super::guidance::DescentProfile;
use super::pid::{Pid, PidGains};

// ---------------------------------------------------------------------------
// Descent autopilot: reference-velocity tracking + attitude hold
// ---------------------------------------------------------------------------

/// Heuristic baseline policy. Tracks the same vertical reference the reward
/// shaper scores against by switching the main engine on the sign of a PID
/// on velocity error, and fires RCS against any tilt outside a deadband.
/// No lateral steering.
#[derive(Debug, Clone)]
pub struct DescentAutopilot {
    pub profile: DescentProfile,
    pub vertical_pid: Pid,
    /// Tilt (deg) tolerated before RCS fires.
    pub deadband_deg: f64,
    dt: f64,
}

impl DescentAutopilot {
    /// `dt` is the policy tick period in seconds.
    pub fn new(profile: DescentProfile, dt: f64) -> Self {
        Self {
            profile,
            vertical_pid: Pid::new(PidGains {
                kp: 1.0,
                ki: 0.2,
                kd: 0.05,
                integral_limit: 5.0,
            }),
            deadband_deg: 2.0,
            dt,
        }
    }

    fn hold_axis(&self, angle_deg: f64) -> AxisCommand {
        if angle_deg > self.deadband_deg {
            AxisCommand::Neg
        } else if angle_deg < -self.deadband_deg {
            AxisCommand::Pos
        } else {
            AxisCommand::Off
        }
    }

    pub fn command(&mut self, obs: &Observation) -> ThrusterCommand {
        let reference = self.profile.reference_velocity(obs.altitude);
        // Positive error: falling faster than the profile allows.
        let error = reference - obs.vy;
        let u = self.vertical_pid.update(error, self.dt);
        ThrusterCommand {
            main_engine: u > 0.0,
            pitch: self.hold_axis(obs.pitch),
            yaw: self.hold_axis(obs.yaw),
        }
    }

    pub fn reset(&mut self) {
        self.vertical_pid.reset();
    }
}

impl super::Policy for DescentAutopilot {
    fn act(&mut self, obs: &Observation) -> ActionTriple {
        self.command(obs).encode()
    }

    fn reset(&mut self) {
        DescentAutopilot::reset(self);
    }

    fn name(&self) -> &str {
        "DescentAutopilot"
    }
}
