use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PID Controller (single axis)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Anti-windup clamp on the integral state.
    pub integral_limit: f64,
}

#[derive(Debug, Clone)]
pub struct Pid {
    pub gains: PidGains,
    integral: f64,
    prev_error: Option<f64>,
}

impl Pid {
    pub fn new(gains: PidGains) -> Self {
        Self { gains, integral: 0.0, prev_error: None }
    }

    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        let g = &self.gains;
        self.integral = (self.integral + error * dt).clamp(-g.integral_limit, g.integral_limit);
        // No derivative on the first sample: there is no previous error to
        // difference against.
        let derivative = match self.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);
        g.kp * error + g.ki * self.integral + g.kd * derivative
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains { kp, ki, kd, integral_limit: 1.0 }
    }

    #[test]
    fn pid_proportional() {
        let mut pid = Pid::new(gains(1.0, 0.0, 0.0));
        let out = pid.update(0.5, 0.02);
        assert!((out - 0.5).abs() < 1e-10, "Pure P should output Kp * error");
    }

    #[test]
    fn pid_integral_winds_up_to_limit() {
        let mut pid = Pid::new(gains(0.0, 1.0, 0.0));
        pid.update(1.0, 0.1);
        let out = pid.update(1.0, 0.1);
        assert!((out - 0.2).abs() < 1e-10, "Integral should accumulate");
        for _ in 0..100 {
            pid.update(1.0, 0.1);
        }
        assert!((pid.update(1.0, 0.1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn no_derivative_kick_on_first_sample() {
        let mut pid = Pid::new(gains(0.0, 0.0, 1.0));
        assert_eq!(pid.update(5.0, 0.02), 0.0);
        assert!((pid.update(6.0, 0.02) - 50.0).abs() < 1e-9);
        pid.reset();
        assert_eq!(pid.update(-3.0, 0.02), 0.0);
    }
}
