use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ControllerError, ControllerResult};
use crate::util::get_config_path;

/// Controller configuration
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pulse: PulseConfig,

    #[serde(default)]
    pub transform: Transform,

    #[serde(default)]
    pub alert: AlertConfig,

    #[serde(default)]
    pub warning: WarningConfig,

    /// How often the coordinator checks the mailbox (milliseconds)
    #[serde(default = "default_polling_interval")]
    pub polling_interval_ms: u64,

    /// Total measurement duration before shutdown (milliseconds)
    #[serde(default = "default_run_duration")]
    pub run_duration_ms: u64,

    #[serde(default)]
    pub log: LogConfig,
}

/// Pulse generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Lower inclusive bound of the pulse width (milliseconds)
    #[serde(default = "default_width_lower")]
    pub width_lower_ms: u16,

    /// Upper inclusive bound of the pulse width (milliseconds)
    #[serde(default = "default_width_upper")]
    pub width_upper_ms: u16,

    /// Delay between two pulses (milliseconds)
    #[serde(default = "default_pulse_interval")]
    pub interval_ms: u64,

    /// Fixed seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Affine mapping from pulse width to the derived (temperature) value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default = "default_offset")]
    pub offset: f64,

    #[serde(default = "default_scale")]
    pub scale: f64,
}

/// Threshold alerting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Median value above which the alert condition holds
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// How long the condition must hold before the alert is raised (milliseconds)
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Maximum age of a reading kept in the sample window (milliseconds)
    #[serde(default = "default_retention")]
    pub retention_ms: u64,
}

/// Warning actuator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningConfig {
    /// Cycle interval of the actuator loop (milliseconds)
    #[serde(default = "default_warning_interval")]
    pub interval_ms: u64,

    /// Minimum time spent in one state before toggling (milliseconds)
    #[serde(default = "default_dwell")]
    pub dwell_ms: u64,
}

/// Diagnostic log file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

fn default_width_lower() -> u16 {
    30
}

fn default_width_upper() -> u16 {
    80
}

fn default_pulse_interval() -> u64 {
    20
}

fn default_offset() -> f64 {
    5.0
}

fn default_scale() -> f64 {
    1.3333
}

fn default_threshold() -> f64 {
    70.0
}

fn default_debounce() -> u64 {
    1000
}

fn default_retention() -> u64 {
    1000
}

fn default_warning_interval() -> u64 {
    5
}

fn default_dwell() -> u64 {
    5
}

fn default_polling_interval() -> u64 {
    1
}

fn default_run_duration() -> u64 {
    10_000
}

fn default_log_enabled() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pulse: PulseConfig::default(),
            transform: Transform::default(),
            alert: AlertConfig::default(),
            warning: WarningConfig::default(),
            polling_interval_ms: default_polling_interval(),
            run_duration_ms: default_run_duration(),
            log: LogConfig::default(),
        }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            width_lower_ms: default_width_lower(),
            width_upper_ms: default_width_upper(),
            interval_ms: default_pulse_interval(),
            seed: None,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            scale: default_scale(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            debounce_ms: default_debounce(),
            retention_ms: default_retention(),
        }
    }
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_warning_interval(),
            dwell_ms: default_dwell(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            directory: default_log_directory(),
        }
    }
}

impl Transform {
    /// Derived value for a pulse width: `(width - offset) * scale`
    pub fn to_value(&self, width_ms: u16) -> f64 {
        (f64::from(width_ms) - self.offset) * self.scale
    }

    /// Pulse width that maps to `value`, rounded to the nearest millisecond
    pub fn to_width(&self, value: f64) -> u16 {
        let width = value / self.scale + self.offset;
        width.round().clamp(0.0, f64::from(u16::MAX)) as u16
    }
}

impl Config {
    /// Load configuration from file, or use defaults if no file is found
    ///
    /// Lookup order: explicit `path`, `$THERMO_GUARD_CONFIG`, then
    /// `~/.config/thermo-guard/controller.json` if it exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(get_config_path)
            .or_else(|| {
                let home = dirs::home_dir()?;
                let default_path = home.join(".config/thermo-guard/controller.json");
                default_path.exists().then_some(default_path)
            });

        let config = match config_path {
            Some(path) => read_config_file(&path)?,
            None => {
                trace!("no config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a runnable controller
    pub fn validate(&self) -> ControllerResult<()> {
        let invalid = |msg: String| -> ControllerResult<()> { Err(ControllerError::InvalidConfig(msg)) };

        let PulseConfig {
            width_lower_ms,
            width_upper_ms,
            ..
        } = self.pulse;
        if width_lower_ms > width_upper_ms {
            return invalid(format!(
                "pulse width range is empty ({width_lower_ms} > {width_upper_ms})"
            ));
        }
        if width_upper_ms == 0 {
            return invalid("pulse width upper bound must be positive".to_string());
        }
        if !self.transform.scale.is_finite() || self.transform.scale == 0.0 {
            return invalid(format!(
                "transform scale must be finite and non-zero, got {}",
                self.transform.scale
            ));
        }
        if !self.transform.offset.is_finite() {
            return invalid("transform offset must be finite".to_string());
        }
        if !self.alert.threshold.is_finite() {
            return invalid("alert threshold must be finite".to_string());
        }
        if self.alert.retention_ms == 0 {
            return invalid("retention span must be positive".to_string());
        }
        if self.warning.interval_ms == 0 {
            return invalid("warning interval must be positive".to_string());
        }
        if self.polling_interval_ms == 0 {
            return invalid("polling interval must be positive".to_string());
        }
        if self.run_duration_ms == 0 {
            return invalid("run duration must be positive".to_string());
        }

        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }
}

pub fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&file_content)
        .with_context(|| format!("Invalid configuration file provided: {}", path.display()))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
