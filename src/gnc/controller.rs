use crate::dynamics::observation::Observation;
use super::actuator::ActionTriple;

/// Trait for descent policies.
///
/// The learner on the other side of the environment boundary implements
/// this; so do the built-in baselines. Called once per in-progress tick.
pub trait Policy {
    /// Choose the discrete action for this tick.
    fn act(&mut self, obs: &Observation) -> ActionTriple;

    /// Clear internal state at episode reset.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Always emits the same action. Useful as a free-fall or full-burn
/// baseline and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantPolicy(pub ActionTriple);

impl Policy for ConstantPolicy {
    fn act(&mut self, _obs: &Observation) -> ActionTriple {
        self.0
    }

    fn name(&self) -> &str {
        "constant"
    }
}
