use std::env;

use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use simbolar_api::level::Calibration;

const DEFAULT_CONFIG: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../",
    "configs/default.toml"
));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

/// Calibration the sensor state starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub height: f64,
    pub sensor_offset: f64,
    pub max_delta: f64,
}

/// Actuator state the command state starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commands {
    pub lcd_on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub tank: Tank,
    pub commands: Commands,
}

impl Tank {
    pub fn calibration(&self) -> Calibration {
        Calibration {
            tank_height: self.height,
            sensor_offset: self.sensor_offset,
            max_delta: self.max_delta,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::load(&run_mode, env::var("PORT").ok())
    }

    /// Layers the bundled defaults, `configs/{run_mode}`, `SIMBOLAR_*` process
    /// variables and finally `port`.
    pub fn load(run_mode: &str, port: Option<String>) -> Result<Self, ConfigError> {
        Self::load_with(run_mode, port, None)
    }

    /// Same as [`Settings::load`], reading the `SIMBOLAR_*` layer from `vars`
    /// instead of the process environment when given.
    ///
    /// Nested keys use `__`, e.g. `SIMBOLAR_SERVER__PORT` or
    /// `SIMBOLAR_TANK__SENSOR_OFFSET`.
    pub fn load_with(
        run_mode: &str,
        port: Option<String>,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("SIMBOLAR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()?;

        if !(settings.tank.height > 0.0) {
            return Err(ConfigError::Message(format!(
                "tank.height must be positive, got {}",
                settings.tank.height
            )));
        }

        if !(settings.tank.max_delta >= 0.0) {
            return Err(ConfigError::Message(format!(
                "tank.max_delta must not be negative, got {}",
                settings.tank.max_delta
            )));
        }

        Ok(settings)
    }
}
