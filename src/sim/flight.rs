use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dynamics::state::{ContactEvent, TargetSite, VehicleState};
use crate::gnc::reward::{RewardShaper, RewardTerms};
use crate::perception::hazard::HazardConfig;
use crate::perception::mailbox::TelemetrySnapshot;

// ---------------------------------------------------------------------------
// Episode outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    #[default]
    InProgress,
    Success,
    Crashed,
    TippedOver,
    Escaped,
    OutOfSensorRange,
    TooFarFromTarget,
}

impl EpisodeOutcome {
    pub fn is_terminal(self) -> bool {
        self != EpisodeOutcome::InProgress
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeOutcome::InProgress => "in_progress",
            EpisodeOutcome::Success => "success",
            EpisodeOutcome::Crashed => "crashed",
            EpisodeOutcome::TippedOver => "tipped_over",
            EpisodeOutcome::Escaped => "escaped",
            EpisodeOutcome::OutOfSensorRange => "out_of_sensor_range",
            EpisodeOutcome::TooFarFromTarget => "too_far_from_target",
        }
    }
}

impl fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Termination thresholds. Altitudes in world units, speeds in units/s,
/// angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLimits {
    /// Sensed altitude above which the vehicle has escaped.
    pub ceiling: f64,
    pub escape_penalty: f64,
    /// Contact closing speed above which the touchdown is a crash.
    pub impact_speed: f64,
    /// A contact while both |pitch| and |yaw| exceed this tips the vehicle.
    pub contact_tilt_limit: f64,
    /// Both |pitch| and |yaw| must be below this for an upright rest.
    pub safe_tilt: f64,
    /// Rest only counts below this altitude; `None` accepts any settled state.
    pub rest_altitude: Option<f64>,
    pub success_reward: f64,
    /// Fallback acceptance radius around the target when no hazard map has
    /// been received.
    pub landing_radius: f64,
}

impl Default for FlightLimits {
    fn default() -> Self {
        Self::precision_landing()
    }
}

impl FlightLimits {
    pub fn precision_landing() -> Self {
        Self {
            ceiling: 1100.0,
            escape_penalty: -1.0,
            impact_speed: 2.0,
            contact_tilt_limit: 40.0,
            safe_tilt: 20.0,
            rest_altitude: Some(1.0),
            success_reward: 100.0,
            landing_radius: 5.0,
        }
    }

    pub fn basic_descent() -> Self {
        Self {
            ceiling: 200.0,
            impact_speed: 5.0,
            rest_altitude: None,
            success_reward: 1.0,
            ..Self::precision_landing()
        }
    }
}

// ---------------------------------------------------------------------------
// FlightStateMachine
// ---------------------------------------------------------------------------

/// Result of one evaluation. `terms` is present only for in-progress ticks,
/// where the reward is the shaped total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub reward: f64,
    pub outcome: EpisodeOutcome,
    pub terms: Option<RewardTerms>,
}

impl TickOutcome {
    fn terminal(outcome: EpisodeOutcome, reward: f64) -> Self {
        Self { reward, outcome, terms: None }
    }
}

/// Per-tick termination and reward decision for one episode at a time.
#[derive(Debug, Clone)]
pub struct FlightStateMachine {
    limits: FlightLimits,
    shaper: RewardShaper,
    hazard: HazardConfig,
    target: TargetSite,
    outcome: EpisodeOutcome,
    ticks: u64,
    cumulative_reward: f64,
}

impl FlightStateMachine {
    pub fn new(
        limits: FlightLimits,
        shaper: RewardShaper,
        hazard: HazardConfig,
        target: TargetSite,
    ) -> Self {
        Self {
            limits,
            shaper,
            hazard,
            target,
            outcome: EpisodeOutcome::InProgress,
            ticks: 0,
            cumulative_reward: 0.0,
        }
    }

    /// Start a new episode toward `target`.
    pub fn reset(&mut self, target: TargetSite) {
        self.target = target;
        self.outcome = EpisodeOutcome::InProgress;
        self.ticks = 0;
        self.cumulative_reward = 0.0;
    }

    pub fn limits(&self) -> &FlightLimits {
        &self.limits
    }

    pub fn shaper(&self) -> &RewardShaper {
        &self.shaper
    }

    pub fn outcome(&self) -> EpisodeOutcome {
        self.outcome
    }

    pub fn target(&self) -> TargetSite {
        self.target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// Evaluate one tick. Checks run in priority order and the first match
    /// wins. After a terminal outcome every call returns that outcome with
    /// zero reward until [`reset`](Self::reset).
    pub fn evaluate(
        &mut self,
        state: &VehicleState,
        contacts: &[ContactEvent],
        snapshot: Option<&TelemetrySnapshot>,
    ) -> TickOutcome {
        if self.outcome.is_terminal() {
            warn!(outcome = %self.outcome, "evaluate called after episode ended");
            return TickOutcome::terminal(self.outcome, 0.0);
        }

        self.ticks += 1;
        let result = self.classify(state, contacts, snapshot);
        self.cumulative_reward += result.reward;
        self.outcome = result.outcome;

        if result.outcome.is_terminal() {
            info!(
                outcome = %result.outcome,
                ticks = self.ticks,
                reward = result.reward,
                total = self.cumulative_reward,
                x = state.position.x,
                altitude = state.position.y,
                z = state.position.z,
                "episode ended"
            );
        } else {
            debug!(tick = self.ticks, reward = result.reward, "tick");
        }
        result
    }

    fn classify(
        &self,
        state: &VehicleState,
        contacts: &[ContactEvent],
        snapshot: Option<&TelemetrySnapshot>,
    ) -> TickOutcome {
        let l = &self.limits;

        if state.position.y > l.ceiling {
            return TickOutcome::terminal(EpisodeOutcome::Escaped, l.escape_penalty);
        }

        let Some(altitude) = state.altitude() else {
            return TickOutcome::terminal(EpisodeOutcome::OutOfSensorRange, 0.0);
        };

        if contacts.iter().any(|c| c.closing_speed > l.impact_speed) {
            return TickOutcome::terminal(EpisodeOutcome::Crashed, 0.0);
        }

        if !contacts.is_empty() && state.attitude.both_exceed(l.contact_tilt_limit) {
            return TickOutcome::terminal(EpisodeOutcome::TippedOver, 0.0);
        }

        let low_enough = l.rest_altitude.map_or(true, |rest| altitude < rest);
        if state.settled && low_enough {
            if !state.attitude.within(l.safe_tilt) {
                return TickOutcome::terminal(EpisodeOutcome::TippedOver, 0.0);
            }
            return if self.landing_valid(state, snapshot) {
                TickOutcome::terminal(EpisodeOutcome::Success, l.success_reward)
            } else {
                TickOutcome::terminal(EpisodeOutcome::TooFarFromTarget, 0.0)
            };
        }

        let terms = self.shaper.shape(state, &self.target);
        TickOutcome {
            reward: terms.total(),
            outcome: EpisodeOutcome::InProgress,
            terms: Some(terms),
        }
    }

    /// Hazard map decides when one has arrived; otherwise the target radius.
    fn landing_valid(&self, state: &VehicleState, snapshot: Option<&TelemetrySnapshot>) -> bool {
        match snapshot {
            Some(s) => s
                .hazard
                .is_valid_landing(state.position.x, state.position.z, &self.hazard),
            None => self.target.distance_to(state) <= self.limits.landing_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use nalgebra::Vector3;

    use crate::dynamics::state::{Attitude, ALTITUDE_UNSENSED};
    use crate::perception::hazard::{Centroid, HazardMap, CELL_SAFE, CELL_UNSAFE};

    fn machine() -> FlightStateMachine {
        FlightStateMachine::new(
            FlightLimits::precision_landing(),
            RewardShaper::default(),
            HazardConfig::default(),
            TargetSite::new(10.0, 10.0),
        )
    }

    fn snapshot(cell: u8) -> TelemetrySnapshot {
        let centroid = Centroid {
            local: (32, 32),
            global: (0, 0),
        };
        TelemetrySnapshot {
            hazard: HazardMap::filled(cell, centroid).unwrap(),
            sequence: 1,
            received_at: Instant::now(),
        }
    }

    fn resting_at(x: f64, z: f64) -> VehicleState {
        let mut s = VehicleState::at(Vector3::new(x, 0.5, z));
        s.settled = true;
        s
    }

    #[test]
    fn in_progress_reward_is_shaped_total() {
        let mut m = machine();
        let state = VehicleState::at(Vector3::new(10.0, 300.0, 10.0));
        let t = m.evaluate(&state, &[], None);
        assert_eq!(t.outcome, EpisodeOutcome::InProgress);
        let terms = t.terms.unwrap();
        assert!((t.reward - terms.total()).abs() < 1e-12);
        assert_eq!(m.ticks(), 1);
    }

    #[test]
    fn escape_terminates_with_penalty() {
        let mut m = machine();
        let state = VehicleState::at(Vector3::new(0.0, 1100.5, 0.0));
        let t = m.evaluate(&state, &[ContactEvent::new(50.0)], None);
        assert_eq!(t.outcome, EpisodeOutcome::Escaped);
        assert_eq!(t.reward, -1.0);
        assert!(t.terms.is_none());
    }

    #[test]
    fn sensor_sentinel_beats_contacts() {
        let mut m = machine();
        let state = VehicleState::at(Vector3::new(0.0, ALTITUDE_UNSENSED, 0.0));
        let t = m.evaluate(&state, &[ContactEvent::new(50.0)], None);
        assert_eq!(t.outcome, EpisodeOutcome::OutOfSensorRange);
        assert_eq!(t.reward, 0.0);
    }

    #[test]
    fn hard_impact_crashes() {
        let mut m = machine();
        let state = VehicleState::at(Vector3::new(10.0, 0.3, 10.0));
        let contacts = [ContactEvent::new(0.5), ContactEvent::new(2.5)];
        let t = m.evaluate(&state, &contacts, None);
        assert_eq!(t.outcome, EpisodeOutcome::Crashed);
        assert_eq!(t.reward, 0.0);
    }

    #[test]
    fn impact_at_threshold_is_not_a_crash() {
        let mut m = machine();
        let state = VehicleState::at(Vector3::new(10.0, 0.3, 10.0));
        let t = m.evaluate(&state, &[ContactEvent::new(2.0)], None);
        assert_eq!(t.outcome, EpisodeOutcome::InProgress);
    }

    #[test]
    fn contact_with_excess_tilt_tips_over() {
        let mut m = machine();
        let mut state = VehicleState::at(Vector3::new(10.0, 0.3, 10.0));
        state.attitude = Attitude::from_degrees(45.0, 0.0, -50.0);
        let t = m.evaluate(&state, &[ContactEvent::new(0.5)], None);
        assert_eq!(t.outcome, EpisodeOutcome::TippedOver);

        // only one axis over the limit
        let mut m = machine();
        state.attitude = Attitude::from_degrees(45.0, 0.0, 10.0);
        let t = m.evaluate(&state, &[ContactEvent::new(0.5)], None);
        assert_eq!(t.outcome, EpisodeOutcome::InProgress);
    }

    #[test]
    fn upright_rest_on_safe_ground_succeeds() {
        let mut m = machine();
        let state = resting_at(10.0, 10.0);
        let t = m.evaluate(&state, &[], Some(&snapshot(CELL_SAFE)));
        assert_eq!(t.outcome, EpisodeOutcome::Success);
        assert_eq!(t.reward, 100.0);
        assert_eq!(m.cumulative_reward(), 100.0);
    }

    #[test]
    fn rest_on_unsafe_ground_is_too_far() {
        let mut m = machine();
        let t = m.evaluate(&resting_at(10.0, 10.0), &[], Some(&snapshot(CELL_UNSAFE)));
        assert_eq!(t.outcome, EpisodeOutcome::TooFarFromTarget);
        assert_eq!(t.reward, 0.0);
    }

    #[test]
    fn tilted_rest_tips_over() {
        let mut m = machine();
        let mut state = resting_at(10.0, 10.0);
        state.attitude = Attitude::from_degrees(25.0, 0.0, 0.0);
        let t = m.evaluate(&state, &[], Some(&snapshot(CELL_SAFE)));
        assert_eq!(t.outcome, EpisodeOutcome::TippedOver);
    }

    #[test]
    fn settled_above_rest_altitude_keeps_flying() {
        let mut m = machine();
        let mut state = resting_at(10.0, 10.0);
        state.position.y = 3.0;
        let t = m.evaluate(&state, &[], Some(&snapshot(CELL_SAFE)));
        assert_eq!(t.outcome, EpisodeOutcome::InProgress);

        // the basic preset has no rest-altitude gate
        let mut basic = FlightStateMachine::new(
            FlightLimits::basic_descent(),
            RewardShaper::default(),
            HazardConfig::default(),
            TargetSite::new(10.0, 10.0),
        );
        let t = basic.evaluate(&state, &[], None);
        assert_eq!(t.outcome, EpisodeOutcome::Success);
        assert_eq!(t.reward, 1.0);
    }

    #[test]
    fn landing_falls_back_to_target_radius() {
        let mut m = machine();
        let t = m.evaluate(&resting_at(13.0, 14.0), &[], None);
        assert_eq!(t.outcome, EpisodeOutcome::Success);

        let mut m = machine();
        let t = m.evaluate(&resting_at(16.0, 10.0), &[], None);
        assert_eq!(t.outcome, EpisodeOutcome::TooFarFromTarget);
    }

    #[test]
    fn terminal_outcome_is_sticky_until_reset() {
        let mut m = machine();
        let crash = VehicleState::at(Vector3::new(10.0, 0.3, 10.0));
        m.evaluate(&crash, &[ContactEvent::new(9.0)], None);
        assert_eq!(m.outcome(), EpisodeOutcome::Crashed);

        let flying = VehicleState::at(Vector3::new(10.0, 300.0, 10.0));
        let t = m.evaluate(&flying, &[], None);
        assert_eq!(t.outcome, EpisodeOutcome::Crashed);
        assert_eq!(t.reward, 0.0);
        assert_eq!(m.ticks(), 1);

        m.reset(TargetSite::new(0.0, 0.0));
        assert_eq!(m.outcome(), EpisodeOutcome::InProgress);
        assert_eq!(m.ticks(), 0);
        assert_eq!(m.cumulative_reward(), 0.0);
        let t = m.evaluate(&flying, &[], None);
        assert_eq!(t.outcome, EpisodeOutcome::InProgress);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&EpisodeOutcome::TooFarFromTarget).unwrap();
        assert_eq!(json, "\"too_far_from_target\"");
        assert_eq!(EpisodeOutcome::OutOfSensorRange.to_string(), "out_of_sensor_range");
        assert!(!EpisodeOutcome::InProgress.is_terminal());
    }
}
