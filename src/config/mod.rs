use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use crate::utils::time::parse_utc_offset;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide settings. Loaded once at startup and then treated as an
/// immutable value handed to `AttendanceApi::open`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub database: String,
    /// Spreadsheet web-app endpoint. A value saved through
    /// `configure_endpoint` takes precedence.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// School timezone used to cut calendar days, e.g. "+09:00".
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connectivity_timeout")]
    pub connectivity_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_export_prefix")]
    pub export_prefix: String,
}

fn default_utc_offset() -> String {
    "+09:00".to_string()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_connectivity_timeout() -> u64 {
    3
}
fn default_poll_interval() -> u64 {
    60
}
fn default_export_prefix() -> String {
    "morning_attendance".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            endpoint: None,
            utc_offset: default_utc_offset(),
            request_timeout_secs: default_request_timeout(),
            connectivity_timeout_secs: default_connectivity_timeout(),
            poll_interval_secs: default_poll_interval(),
            export_prefix: default_export_prefix(),
        }
    }
}

impl Config {
    /// Config for a given database file, everything else default.
    pub fn with_database(path: impl Into<String>) -> Self {
        Self {
            database: path.into(),
            ..Self::default()
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rattendance")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rattendance")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rattendance.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rattendance.sqlite")
    }

    /// Load configuration from the standard file, or defaults if not found.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Initialize configuration and database files in the standard location.
    pub fn init_all(custom_db: Option<String>) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = match custom_db {
            Some(name) => {
                let p = expand_tilde(&name);
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        let config = Self::with_database(db_path.to_string_lossy().to_string());
        config.save_to(&Self::config_file())?;

        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        self.offset()?;
        if self.connectivity_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(AppError::Config("timeouts must be greater than zero".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config("poll interval must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    pub fn offset(&self) -> AppResult<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
            .ok_or_else(|| AppError::Config(format!("invalid utc_offset '{}'", self.utc_offset)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
