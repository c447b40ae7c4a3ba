use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ConfigError;
use crate::gnc::reward::RewardCoefficients;
use crate::perception::channel::TelemetryConfig;
use crate::perception::hazard::HazardConfig;
use crate::sim::flight::FlightLimits;
use crate::sim::spawn::SpawnConfig;

pub const ENV_RX_PORT: &str = "LANDER_RX_PORT";
pub const ENV_REMOTE_HOST: &str = "LANDER_REMOTE_HOST";
pub const ENV_REMOTE_PORT: &str = "LANDER_REMOTE_PORT";

/// Named parameter sets for the two training scenarios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Targeted descent from ~500 u onto a hazard-checked site.
    #[default]
    Precision,
    /// Untargeted drop from ~100 u.
    Basic,
}

/// Everything the GNC core is parameterized by. Missing keys in a config
/// file fall back to the chosen profile's preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GncConfig {
    pub telemetry: TelemetryConfig,
    pub flight: FlightLimits,
    pub reward: RewardCoefficients,
    pub hazard: HazardConfig,
    pub spawn: SpawnConfig,
    /// Hard cap on ticks per episode in the drivers.
    pub max_ticks: u64,
    /// Control period in seconds.
    pub tick_seconds: f64,
}

impl Default for GncConfig {
    fn default() -> Self {
        Self::preset(Profile::Precision)
    }
}

impl GncConfig {
    pub fn preset(profile: Profile) -> Self {
        let (flight, reward, spawn) = match profile {
            Profile::Precision => (
                FlightLimits::precision_landing(),
                RewardCoefficients::precision_landing(),
                SpawnConfig::default(),
            ),
            Profile::Basic => (
                FlightLimits::basic_descent(),
                RewardCoefficients::basic_descent(),
                SpawnConfig::basic_descent(),
            ),
        };
        Self {
            telemetry: TelemetryConfig::default(),
            flight,
            reward,
            hazard: HazardConfig::default(),
            spawn,
            max_ticks: 10_000,
            tick_seconds: 0.02,
        }
    }

    /// Load from a JSON file. Keys the file leaves out, at any depth, keep
    /// their value from `GncConfig::preset(profile)`.
    pub fn load(path: impl AsRef<Path>, profile: Profile) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let parse_err = |source: serde_json::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overlay: Value = serde_json::from_str(&text).map_err(parse_err)?;
        let mut merged = serde_json::to_value(Self::preset(profile)).map_err(parse_err)?;
        merge_json(&mut merged, overlay);
        serde_json::from_value(merged).map_err(parse_err)
    }

    /// Apply `LANDER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Unparseable values
    /// are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let t = &mut self.telemetry;
        t.rx_port = read_var(&lookup, ENV_RX_PORT, t.rx_port);
        if let Some(host) = lookup(ENV_REMOTE_HOST).filter(|h| !h.trim().is_empty()) {
            t.remote_host = host.trim().to_string();
        }
        t.remote_port = read_var(&lookup, ENV_REMOTE_PORT, t.remote_port);
    }
}

/// Recursively overlay `patch` onto `base`. Objects merge key by key;
/// anything else replaces.
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn read_var<T, F>(lookup: &F, name: &str, default: T) -> T
where
    T: FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(var = name, value = %value, "ignoring unparseable override");
                default
            }
        },
        None => default,
    }
}
