pub mod config;
pub mod error;
pub mod dynamics;
pub mod gnc;
pub mod perception;
pub mod sim;
pub mod io;

pub use config::{GncConfig, Profile};
pub use error::{ConfigError, DatagramError, ReplayError, TelemetryError};
