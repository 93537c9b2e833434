use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scan_engine::{ensure_dir, AtomicFileWriter, FacingMode, PersistError, ServiceSettings};
use scan_logging::LogDestination;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "scan.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let settings = ServiceSettings::default();
        Self {
            base_url: settings.base_url,
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
        }
    }
}

impl ServiceConfig {
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogOutput> for LogDestination {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    #[default]
    Environment,
    User,
    Any,
}

impl From<CameraFacing> for FacingMode {
    fn from(facing: CameraFacing) -> Self {
        match facing {
            CameraFacing::Environment => FacingMode::Environment,
            CameraFacing::User => FacingMode::User,
            CameraFacing::Any => FacingMode::Any,
        }
    }
}

/// Settings read from `scan.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    /// Where `scan_history.json` and `user_preferences.json` live.
    pub data_dir: PathBuf,
    pub log_destination: LogOutput,
    pub log_file: PathBuf,
    pub facing_mode: CameraFacing,
    /// Run the ingredient analysis right after a successful lookup or OCR.
    pub auto_analyze: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            data_dir: PathBuf::from("./scan_data"),
            log_destination: LogOutput::default(),
            log_file: PathBuf::from("./scan.log"),
            facing_mode: CameraFacing::default(),
            auto_analyze: false,
        }
    }
}

/// Reads the config. A missing file yields the defaults; any other failure
/// is returned so the caller can report it once logging is up.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Writes `config` as pretty RON, replacing any existing file atomically.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&dir)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_CONFIG_FILE);

    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(config, pretty)?;
    let written = AtomicFileWriter::new(dir).write(file_name, &content)?;
    Ok(written)
}
