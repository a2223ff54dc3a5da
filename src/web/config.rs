use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::notification::IndicatorContent;
use crate::publish::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
use crate::sensor::{parse_origin, PositionSensor, SimulatedSensor, TrackSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub web: WebConfig,
    pub sensor: SensorConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub notification: IndicatorContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Exit the daemon once tracking is stopped; the supervisor starts it again.
    #[serde(default = "default_true")]
    pub exit_on_stop: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            state_file: default_state_file(),
            exit_on_stop: true,
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("/var/lib/duty-beacon/duty_state.yaml")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorConfig {
    Simulated {
        origin: String,
        #[serde(default = "default_speed")]
        speed_mps: f64,
        #[serde(default = "default_accuracy")]
        accuracy_meters: f64,
        #[serde(
            default = "default_interval",
            deserialize_with = "deserialize_duration"
        )]
        interval: Duration,
        #[serde(default = "default_true")]
        permission_granted: bool,
    },
}

fn default_speed() -> f64 {
    8.0
}

fn default_accuracy() -> f64 {
    5.0
}

fn default_interval() -> Duration {
    Duration::from_secs(20)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteConfig {
    Http {
        base_url: String,
        #[serde(default = "default_collection")]
        collection: String,
    },
    Memory,
}

fn default_collection() -> String {
    "drivers".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.sensor.build()?;
        config.remote.build()?;
        Ok(config)
    }
}

impl SensorConfig {
    pub fn build(&self) -> Result<Arc<dyn PositionSensor>, ConfigError> {
        match self {
            SensorConfig::Simulated {
                origin,
                speed_mps,
                accuracy_meters,
                interval,
                permission_granted,
            } => {
                let origin = parse_origin(origin).ok_or_else(|| {
                    ConfigError::Invalid(format!("sensor origin {:?} is not \"lat,lon\"", origin))
                })?;
                if *speed_mps < 0.0 || *accuracy_meters < 0.0 {
                    return Err(ConfigError::Invalid(
                        "sensor speed and accuracy must not be negative".into(),
                    ));
                }
                if interval.is_zero() {
                    return Err(ConfigError::Invalid("sensor interval must be positive".into()));
                }
                let settings = TrackSettings {
                    origin,
                    speed_mps: *speed_mps,
                    accuracy_meters: *accuracy_meters,
                    interval: *interval,
                };
                Ok(Arc::new(SimulatedSensor::new(settings, *permission_granted)))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SensorConfig::Simulated {
                origin, interval, ..
            } => format!(
                "simulated from {} every {}",
                origin,
                humantime::format_duration(*interval)
            ),
        }
    }
}

impl RemoteConfig {
    pub fn build(&self) -> Result<Arc<dyn RemoteStore>, ConfigError> {
        match self {
            RemoteConfig::Http {
                base_url,
                collection,
            } => {
                let store = HttpRemoteStore::new(base_url, collection)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(Arc::new(store))
            }
            RemoteConfig::Memory => Ok(Arc::new(MemoryRemoteStore::new())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RemoteConfig::Http {
                base_url,
                collection,
            } => format!("http {} ({})", base_url, collection),
            RemoteConfig::Memory => "in-memory".to_string(),
        }
    }
}
