pub mod flight;
pub mod event;
pub mod spawn;
pub mod runner;
pub mod replay;

pub use event::{ContactQueue, EpisodeEvent, EventKind};
pub use flight::{EpisodeOutcome, FlightLimits, FlightStateMachine, TickOutcome};
pub use replay::TrajectoryReplay;
pub use runner::{run_episode, EpisodeLog, FlightLoop, TickRecord, VehicleStateProvider};
pub use spawn::{Spawn, SpawnConfig, Spawner};
