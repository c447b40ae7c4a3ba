use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Discrete action encoding
// ---------------------------------------------------------------------------

/// Raw action triple from the policy: main engine code, pitch axis code,
/// yaw axis code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTriple {
    pub main: i32,
    pub pitch: i32,
    pub yaw: i32,
}

impl ActionTriple {
    pub const fn new(main: i32, pitch: i32, yaw: i32) -> Self {
        Self { main, pitch, yaw }
    }
}

/// Tri-state RCS axis. One value per axis, so both directions can never be
/// lit at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisCommand {
    Neg,
    #[default]
    Off,
    Pos,
}

impl AxisCommand {
    /// 0 = off, 1 = neg, 2 = pos; anything else is off.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => AxisCommand::Neg,
            2 => AxisCommand::Pos,
            _ => AxisCommand::Off,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            AxisCommand::Off => 0,
            AxisCommand::Neg => 1,
            AxisCommand::Pos => 2,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            AxisCommand::Neg => -1.0,
            AxisCommand::Off => 0.0,
            AxisCommand::Pos => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrusterCommand {
    pub main_engine: bool,
    pub pitch: AxisCommand,
    pub yaw: AxisCommand,
}

impl ThrusterCommand {
    pub fn decode(action: ActionTriple) -> Self {
        Self {
            main_engine: action.main == 1,
            pitch: AxisCommand::from_code(action.pitch),
            yaw: AxisCommand::from_code(action.yaw),
        }
    }

    pub fn encode(&self) -> ActionTriple {
        ActionTriple::new(i32::from(self.main_engine), self.pitch.code(), self.yaw.code())
    }
}

// ---------------------------------------------------------------------------
// ActuatorMapper: hold-last-value command latch
// ---------------------------------------------------------------------------

/// Latches the most recent action. The engine reads [`held`](Self::held)
/// every physics step until the next action arrives.
#[derive(Debug, Clone, Default)]
pub struct ActuatorMapper {
    held: ThrusterCommand,
    updates: u64,
}

impl ActuatorMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: ActionTriple) -> ThrusterCommand {
        self.held = ThrusterCommand::decode(action);
        self.updates += 1;
        self.held
    }

    pub fn held(&self) -> ThrusterCommand {
        self.held
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Thruster layout: command -> body-frame wrench
// ---------------------------------------------------------------------------

/// Force and torque about the body origin, body frame (Y = thrust axis).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyWrench {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

impl BodyWrench {
    pub fn zero() -> Self {
        Self {
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    fn add_at(&mut self, force: Vector3<f64>, point: Vector3<f64>) {
        self.force += force;
        self.torque += point.cross(&force);
    }
}

/// Main engine on the thrust axis plus four RCS pairs mounted on a ring of
/// half-width `rcs_arm` at `rcs_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrusterLayout {
    pub main_thrust: f64,         // N
    pub main_mount: Vector3<f64>, // body frame
    pub rcs_thrust: f64,          // N per nozzle
    pub rcs_height: f64,
    pub rcs_arm: f64,
}

impl Default for ThrusterLayout {
    fn default() -> Self {
        Self {
            main_thrust: 45_000.0,
            main_mount: Vector3::new(0.0, 1.0, 0.0),
            rcs_thrust: 450.0,
            rcs_height: 5.5,
            rcs_arm: 2.0,
        }
    }
}

impl ThrusterLayout {
    pub fn wrench(&self, cmd: &ThrusterCommand) -> BodyWrench {
        let mut w = BodyWrench::zero();
        let (h, a, t) = (self.rcs_height, self.rcs_arm, self.rcs_thrust);

        if cmd.main_engine {
            w.add_at(Vector3::new(0.0, self.main_thrust, 0.0), self.main_mount);
        }

        // Pitch pair fires along Z from the side opposite the push.
        let s = cmd.pitch.sign();
        if s != 0.0 {
            let f = Vector3::new(0.0, 0.0, s * t);
            w.add_at(f, Vector3::new(a, h, -s * a));
            w.add_at(f, Vector3::new(-a, h, -s * a));
        }

        // Yaw pair fires along X.
        let s = cmd.yaw.sign();
        if s != 0.0 {
            let f = Vector3::new(s * t, 0.0, 0.0);
            w.add_at(f, Vector3::new(-s * a, h, a));
            w.add_at(f, Vector3::new(-s * a, h, -a));
        }

        w
    }
}
