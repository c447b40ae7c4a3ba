use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::{Attitude, TargetSite, VehicleState};

// ---------------------------------------------------------------------------
// Randomized episode starts
// ---------------------------------------------------------------------------

/// Distribution of initial conditions. Jitters are half-widths of uniform
/// ranges centred on zero (or on `center`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Horizontal (x, z) point spawns and targets are scattered around.
    pub center: (f64, f64),
    pub position_jitter: f64,
    pub altitude_min: f64,
    pub altitude_max: f64,
    /// Degrees, applied to pitch and yaw.
    pub attitude_jitter: f64,
    /// Initial sink rate drawn from `[0, descent_speed_max)`.
    pub descent_speed_max: f64,
    pub target_jitter: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            center: (100.0, 100.0),
            position_jitter: 20.0,
            altitude_min: 500.0,
            altitude_max: 520.0,
            attitude_jitter: 5.0,
            descent_speed_max: 10.0,
            target_jitter: 5.0,
        }
    }
}

impl SpawnConfig {
    /// Short drop from ~100 u with a large initial tilt and a fixed target.
    pub fn basic_descent() -> Self {
        Self {
            center: (0.0, 0.0),
            position_jitter: 40.0,
            altitude_min: 80.0,
            altitude_max: 100.0,
            attitude_jitter: 20.0,
            descent_speed_max: 0.0,
            target_jitter: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub state: VehicleState,
    pub target: TargetSite,
}

/// Seeded spawn sampler; the same seed yields the same sequence.
#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnConfig,
    rng: fastrand::Rng,
}

impl Spawner {
    pub fn new(config: SpawnConfig, seed: u64) -> Self {
        Self {
            config,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn sample(&mut self) -> Spawn {
        let c = self.config;
        let (cx, cz) = c.center;

        let x = cx + self.symmetric(c.position_jitter);
        let z = cz + self.symmetric(c.position_jitter);
        let altitude = c.altitude_min + self.rng.f64() * (c.altitude_max - c.altitude_min).max(0.0);

        let mut state = VehicleState::at(Vector3::new(x, altitude, z));
        state.attitude = Attitude::from_degrees(
            self.symmetric(c.attitude_jitter),
            0.0,
            self.symmetric(c.attitude_jitter),
        );
        state.velocity.y = -self.rng.f64() * c.descent_speed_max;

        let target = TargetSite::new(
            cx + self.symmetric(c.target_jitter),
            cz + self.symmetric(c.target_jitter),
        );
        Spawn { state, target }
    }

    fn symmetric(&mut self, half_width: f64) -> f64 {
        (self.rng.f64() * 2.0 - 1.0) * half_width
    }
}
