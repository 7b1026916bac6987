use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Tunable constants of a simulation. All durations are simulated seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed of the random generator behind floating drift and entity factories.
    pub seed: u64,
    pub default_conformation_duration: f64,
    /// Speed of the Brownian drift of floating compounds.
    pub float_speed: f64,
    pub float_direction_change_min: f64,
    pub float_direction_change_max: f64,
    /// Speed at which attraction sections pull their anchor.
    pub attraction_speed: f64,
    pub attraction_distance: f64,
    pub attraction_timeout: f64,
    pub step_conformation_interval: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            default_conformation_duration: 1.0,
            float_speed: 10.0,
            float_direction_change_min: 0.1,
            float_direction_change_max: 2.0,
            attraction_speed: 50.0,
            attraction_distance: 10.0,
            attraction_timeout: 30.0,
            step_conformation_interval: 1.0,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: SimulationConfig = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("default_conformation_duration", self.default_conformation_duration)?;
        non_negative("float_speed", self.float_speed)?;
        positive("float_direction_change_min", self.float_direction_change_min)?;
        if !(self.float_direction_change_max > self.float_direction_change_min) {
            return Err(ConfigError::InvalidParameter {
                name: "float_direction_change_max",
                reason: format!(
                    "must exceed float_direction_change_min ({})",
                    self.float_direction_change_min
                ),
            });
        }
        non_negative("attraction_speed", self.attraction_speed)?;
        non_negative("attraction_distance", self.attraction_distance)?;
        non_negative("attraction_timeout", self.attraction_timeout)?;
        positive("step_conformation_interval", self.step_conformation_interval)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be positive and finite, got {}", value),
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be non-negative and finite, got {}", value),
        })
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    seed: Option<u64>,
    default_conformation_duration: Option<f64>,
    float_speed: Option<f64>,
    float_direction_change: Option<(f64, f64)>,
    attraction_speed: Option<f64>,
    attraction_distance: Option<f64>,
    attraction_timeout: Option<f64>,
    step_conformation_interval: Option<f64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn default_conformation_duration(mut self, seconds: f64) -> Self {
        self.default_conformation_duration = Some(seconds);
        self
    }

    pub fn float_speed(mut self, speed: f64) -> Self {
        self.float_speed = Some(speed);
        self
    }

    pub fn float_direction_change(mut self, min: f64, max: f64) -> Self {
        self.float_direction_change = Some((min, max));
        self
    }

    pub fn attraction_speed(mut self, speed: f64) -> Self {
        self.attraction_speed = Some(speed);
        self
    }

    pub fn attraction_distance(mut self, distance: f64) -> Self {
        self.attraction_distance = Some(distance);
        self
    }

    pub fn attraction_timeout(mut self, seconds: f64) -> Self {
        self.attraction_timeout = Some(seconds);
        self
    }

    pub fn step_conformation_interval(mut self, seconds: f64) -> Self {
        self.step_conformation_interval = Some(seconds);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let defaults = SimulationConfig::default();
        let (change_min, change_max) = self.float_direction_change.unwrap_or((
            defaults.float_direction_change_min,
            defaults.float_direction_change_max,
        ));

        let config = SimulationConfig {
            seed: self.seed.unwrap_or(defaults.seed),
            default_conformation_duration: self
                .default_conformation_duration
                .unwrap_or(defaults.default_conformation_duration),
            float_speed: self.float_speed.unwrap_or(defaults.float_speed),
            float_direction_change_min: change_min,
            float_direction_change_max: change_max,
            attraction_speed: self.attraction_speed.unwrap_or(defaults.attraction_speed),
            attraction_distance: self
                .attraction_distance
                .unwrap_or(defaults.attraction_distance),
            attraction_timeout: self
                .attraction_timeout
                .unwrap_or(defaults.attraction_timeout),
            step_conformation_interval: self
                .step_conformation_interval
                .unwrap_or(defaults.step_conformation_interval),
        };
        config.validate()?;
        Ok(config)
    }
}
