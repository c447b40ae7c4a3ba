pub mod state;
pub mod observation;

pub use observation::{Observation, OBSERVATION_LEN};
pub use state::{
    wrap_degrees, Attitude, ContactEvent, TargetSite, VehicleState, ALTITUDE_UNSENSED,
};
