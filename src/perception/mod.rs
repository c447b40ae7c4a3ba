pub mod hazard;
pub mod datagram;
pub mod mailbox;
pub mod channel;

pub use channel::{ChannelStats, TelemetryChannel, TelemetryConfig, TelemetryLink};
pub use hazard::{Centroid, HazardConfig, HazardMap, Validity, GRID_CELLS, GRID_SIZE};
pub use mailbox::{SnapshotMailbox, TelemetrySnapshot};
