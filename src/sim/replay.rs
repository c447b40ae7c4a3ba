use crate::dynamics::state::{ContactEvent, VehicleState};
use crate::gnc::actuator::{BodyWrench, ThrusterCommand};
use crate::io::csv::TrajectoryRow;
use super::event::ContactQueue;
use super::runner::VehicleStateProvider;
use super::spawn::Spawn;

/// Plays back a recorded trajectory, one row per tick. Commands are recorded
/// but have no effect on the recording.
#[derive(Debug, Clone)]
pub struct TrajectoryReplay {
    rows: Vec<TrajectoryRow>,
    cursor: usize,
    contacts: ContactQueue,
    commands: Vec<ThrusterCommand>,
}

impl TrajectoryReplay {
    pub fn new(rows: Vec<TrajectoryRow>) -> Self {
        Self {
            rows,
            cursor: 0,
            contacts: ContactQueue::new(),
            commands: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Initial state of the recording, if any.
    pub fn first_state(&self) -> Option<&VehicleState> {
        self.rows.first().map(|r| &r.state)
    }

    pub fn commands(&self) -> &[ThrusterCommand] {
        &self.commands
    }
}

impl VehicleStateProvider for TrajectoryReplay {
    /// Rewinds to the first row; the recording fixes the start, not the spawn.
    fn reset(&mut self, _spawn: &Spawn) {
        self.cursor = 0;
        self.contacts.clear();
        self.commands.clear();
    }

    fn sense(&mut self) -> Option<VehicleState> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        if let Some(contact) = row.contact {
            self.contacts.push(contact);
        }
        Some(row.state.clone())
    }

    fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        self.contacts.drain()
    }

    fn actuate(&mut self, command: &ThrusterCommand, _wrench: &BodyWrench) {
        self.commands.push(*command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    use crate::dynamics::state::TargetSite;
    use crate::gnc::controller::ConstantPolicy;
    use crate::gnc::actuator::ThrusterLayout;
    use crate::gnc::reward::RewardShaper;
    use crate::perception::hazard::HazardConfig;
    use crate::sim::flight::{EpisodeOutcome, FlightLimits, FlightStateMachine};
    use crate::sim::runner::{run_episode, FlightLoop};

    fn row(altitude: f64, vy: f64, contact: Option<f64>, settled: bool) -> TrajectoryRow {
        let mut state = VehicleState::at(Vector3::new(2.0, altitude, 3.0));
        state.velocity.y = vy;
        state.settled = settled;
        TrajectoryRow {
            state,
            contact: contact.map(ContactEvent::new),
        }
    }

    fn replay_outcome(rows: Vec<TrajectoryRow>) -> (EpisodeOutcome, usize, usize) {
        let mut replay = TrajectoryReplay::new(rows);
        let spawn = Spawn {
            state: replay.first_state().cloned().unwrap(),
            target: TargetSite::new(2.0, 3.0),
        };
        let machine = FlightStateMachine::new(
            FlightLimits::precision_landing(),
            RewardShaper::default(),
            HazardConfig::default(),
            spawn.target,
        );
        let mut flight = FlightLoop::new(machine, ThrusterLayout::default());
        let mut policy = ConstantPolicy::default();
        let log = run_episode(&mut flight, &mut replay, &mut policy, &spawn, 1_000);
        (log.outcome, log.ticks(), replay.commands().len())
    }

    #[test]
    fn gentle_recording_lands() {
        let rows = vec![
            row(3.0, -1.0, None, false),
            row(1.5, -1.0, None, false),
            row(0.2, -0.8, Some(0.8), false),
            row(0.2, 0.0, None, true),
            row(0.2, 0.0, None, true),
        ];
        let (outcome, ticks, commands) = replay_outcome(rows);
        assert_eq!(outcome, EpisodeOutcome::Success);
        assert_eq!(ticks, 4);
        assert_eq!(commands, 3);
    }

    #[test]
    fn hard_recording_crashes() {
        let rows = vec![
            row(3.0, -9.0, None, false),
            row(0.1, -9.0, Some(9.0), false),
            row(0.1, 0.0, None, true),
        ];
        let (outcome, ticks, _) = replay_outcome(rows);
        assert_eq!(outcome, EpisodeOutcome::Crashed);
        assert_eq!(ticks, 2);
    }

    #[test]
    fn exhausted_recording_is_truncated() {
        let rows = vec![row(50.0, -3.0, None, false), row(49.9, -3.0, None, false)];
        let (outcome, ticks, commands) = replay_outcome(rows);
        assert_eq!(outcome, EpisodeOutcome::InProgress);
        assert_eq!(ticks, 2);
        assert_eq!(commands, 2);
    }
}
