use serde::Serialize;
use tracing::{info, warn};

use crate::dynamics::observation::Observation;
use crate::dynamics::state::{ContactEvent, TargetSite, VehicleState};
use crate::gnc::actuator::{ActuatorMapper, BodyWrench, ThrusterCommand, ThrusterLayout};
use crate::gnc::reward::RewardTerms;
use crate::gnc::Policy;
use crate::perception::channel::TelemetryLink;
use super::event::{EpisodeEvent, EventKind};
use super::flight::{EpisodeOutcome, FlightStateMachine};
use super::spawn::Spawn;

// ---------------------------------------------------------------------------
// Physics seam
// ---------------------------------------------------------------------------

/// The physics engine as seen from the tick loop.
pub trait VehicleStateProvider {
    /// Place the vehicle at a new spawn.
    fn reset(&mut self, _spawn: &Spawn) {}

    /// State for this tick, or `None` when the provider has nothing more
    /// to give (end of a recording, engine shut down).
    fn sense(&mut self) -> Option<VehicleState>;

    /// Contacts queued since the previous tick.
    fn drain_contacts(&mut self) -> Vec<ContactEvent>;

    /// Apply the held command until the next tick.
    fn actuate(&mut self, command: &ThrusterCommand, wrench: &BodyWrench);
}

// ---------------------------------------------------------------------------
// Tick records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub state: VehicleState,
    pub contacts: Vec<ContactEvent>,
    /// Sequence of the telemetry snapshot visible on this tick.
    pub snapshot_sequence: Option<u64>,
    pub reward: f64,
    pub outcome: EpisodeOutcome,
    pub terms: Option<RewardTerms>,
    /// Command held after this tick.
    pub command: ThrusterCommand,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeLog {
    pub target: TargetSite,
    pub records: Vec<TickRecord>,
    pub events: Vec<EpisodeEvent>,
    pub outcome: EpisodeOutcome,
    pub total_reward: f64,
    /// Stopped without a terminal outcome (tick limit or provider exhausted).
    pub truncated: bool,
}

impl EpisodeLog {
    pub fn ticks(&self) -> usize {
        self.records.len()
    }

    pub fn final_state(&self) -> Option<&VehicleState> {
        self.records.last().map(|r| &r.state)
    }

    pub fn telemetry_seen(&self) -> bool {
        self.records.iter().any(|r| r.snapshot_sequence.is_some())
    }
}

// ---------------------------------------------------------------------------
// FlightLoop: one fixed-order tick
// ---------------------------------------------------------------------------

/// Owns the per-episode GNC state and wires the collaborators together.
/// Telemetry is optional; without it landing validity uses the target
/// radius.
pub struct FlightLoop<'a> {
    pub machine: FlightStateMachine,
    pub mapper: ActuatorMapper,
    pub layout: ThrusterLayout,
    link: Option<&'a dyn TelemetryLink>,
}

impl<'a> FlightLoop<'a> {
    pub fn new(machine: FlightStateMachine, layout: ThrusterLayout) -> Self {
        Self {
            machine,
            mapper: ActuatorMapper::new(),
            layout,
            link: None,
        }
    }

    pub fn with_link(mut self, link: &'a dyn TelemetryLink) -> Self {
        self.link = Some(link);
        self
    }

    pub fn reset(&mut self, target: TargetSite) {
        self.machine.reset(target);
        self.mapper.reset();
    }

    /// Sense, report position, drain contacts, read the latest snapshot,
    /// evaluate, and (while in progress) act. Returns `None` if the provider
    /// has no state for this tick.
    pub fn tick(
        &mut self,
        provider: &mut dyn VehicleStateProvider,
        policy: &mut dyn Policy,
    ) -> Option<TickRecord> {
        let state = provider.sense()?;

        if let Some(link) = self.link {
            if let Err(e) = link.send_position(&state.position) {
                warn!(error = %e, "position report failed");
            }
        }

        let contacts = provider.drain_contacts();
        let snapshot = self.link.and_then(|l| l.latest());
        let result = self.machine.evaluate(&state, &contacts, snapshot.as_deref());

        let command = if result.outcome.is_terminal() {
            self.mapper.held()
        } else {
            let obs = Observation::encode(&state, &self.machine.target());
            let cmd = self.mapper.apply(policy.act(&obs));
            provider.actuate(&cmd, &self.layout.wrench(&cmd));
            cmd
        };

        Some(TickRecord {
            tick: self.machine.ticks(),
            state,
            contacts,
            snapshot_sequence: snapshot.map(|s| s.sequence),
            reward: result.reward,
            outcome: result.outcome,
            terms: result.terms,
            command,
        })
    }
}

// ---------------------------------------------------------------------------
// Episode driver
// ---------------------------------------------------------------------------

/// Run one episode from `spawn` until a terminal outcome, `max_ticks`, or
/// the provider runs dry.
pub fn run_episode(
    flight: &mut FlightLoop<'_>,
    provider: &mut dyn VehicleStateProvider,
    policy: &mut dyn Policy,
    spawn: &Spawn,
    max_ticks: u64,
) -> EpisodeLog {
    flight.reset(spawn.target);
    provider.reset(spawn);
    policy.reset();

    let mut records = Vec::new();
    let mut events = vec![EpisodeEvent {
        tick: 0,
        kind: EventKind::Reset,
    }];
    let mut last_sequence = 0;

    while (records.len() as u64) < max_ticks {
        let Some(record) = flight.tick(provider, policy) else {
            break;
        };
        let tick = record.tick;

        if let Some(seq) = record.snapshot_sequence {
            if seq > last_sequence {
                last_sequence = seq;
                events.push(EpisodeEvent {
                    tick,
                    kind: EventKind::TelemetryAcquired { sequence: seq },
                });
            }
        }
        for c in &record.contacts {
            events.push(EpisodeEvent {
                tick,
                kind: EventKind::Contact {
                    closing_speed: c.closing_speed,
                },
            });
        }

        let outcome = record.outcome;
        records.push(record);
        if outcome.is_terminal() {
            events.push(EpisodeEvent {
                tick,
                kind: EventKind::Terminal(outcome),
            });
            break;
        }
    }

    let outcome = flight.machine.outcome();
    let truncated = !outcome.is_terminal();
    let total_reward = flight.machine.cumulative_reward();
    info!(
        policy = policy.name(),
        %outcome,
        ticks = records.len(),
        total_reward,
        truncated,
        "episode finished"
    );

    EpisodeLog {
        target: spawn.target,
        records,
        events,
        outcome,
        total_reward,
        truncated,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
