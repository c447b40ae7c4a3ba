pub mod actuator;
pub mod autopilot;
pub mod controller;
pub mod guidance;
pub mod pid;
pub mod reward;

pub use actuator::{ActionTriple, ActuatorMapper, AxisCommand, BodyWrench, ThrusterCommand, ThrusterLayout};
pub use autopilot::DescentAutopilot;
pub use controller::{ConstantPolicy, Policy};
pub use guidance::{DescentProfile, LateralProfile};
pub use pid::{Pid, PidGains};
pub use reward::{RewardCoefficients, RewardShaper, RewardTerms};
