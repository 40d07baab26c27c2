use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::scheduler::RetryPolicy;
use crate::orchestrator::retention::RetentionPolicy;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file {0}")]
    ReadFailed(path::PathBuf),
    #[error("failed to write config file {0}")]
    WriteFailed(path::PathBuf),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("no config path available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub probe: ProbeConfig,
    pub schedule: ScheduleConfig,
    pub retention: RetentionConfig,
    pub retry: RetryConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub check_interval_seconds: u64,
    pub retention_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub window_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_seconds: u64,
    pub use_jitter: bool,
    pub use_delay_exponent: bool,
    pub max_delay_exponent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "resmon.db".into(), max_connections: 16 }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_seconds: 10, user_agent: concat!("resmon/", env!("CARGO_PKG_VERSION")).into() }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { check_interval_seconds: 60, retention_interval_seconds: 3600 }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { window_hours: RetentionPolicy::default().window_hours }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            delay_seconds: policy.delay.as_secs(),
            use_jitter: policy.use_jitter,
            use_delay_exponent: policy.use_delay_exponent,
            max_delay_exponent: policy.max_delay_exponent,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into(), format: "compact".into() }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ScheduleConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds.max(1))
    }

    pub fn retention_interval(&self) -> Duration {
        Duration::from_secs(self.retention_interval_seconds.max(1))
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy { window_hours: self.window_hours }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_secs(self.delay_seconds),
            use_jitter: self.use_jitter,
            use_delay_exponent: self.use_delay_exponent,
            max_delay_exponent: self.max_delay_exponent,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/resmon/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Ok(home_dir) = env::var("HOME") {
        path::PathBuf::from(home_dir).join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("resmon/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_1(f, "Max Connections", &self.database.max_connections)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (s)", &self.probe.timeout_seconds)?;
        write_1(f, "User Agent", &self.probe.user_agent)?;
        write_title_1(f, "Schedule")?;
        write_1(f, "Check Interval (s)", &self.schedule.check_interval_seconds)?;
        write_1(f, "Retention Interval (s)", &self.schedule.retention_interval_seconds)?;
        write_title_1(f, "Retention")?;
        write_1(f, "Window (h)", &self.retention.window_hours)?;
        write_title_1(f, "Retry")?;
        write_1(f, "Max Retries", &self.retry.max_retries)?;
        write_1(f, "Delay (s)", &self.retry.delay_seconds)?;
        write_1(f, "Jitter", &self.retry.use_jitter)?;
        write_1(f, "Exponential", &self.retry.use_delay_exponent)?;
        write_1(f, "Max Exponent", &self.retry.max_delay_exponent)?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;
        write_1(f, "Format", &self.logging.format)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/resmon/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// # use resmon_service::config::Config;
    /// let cfg = Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), resmon_service::config::Error>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|_err| Error::ReadFailed(config_path.clone()))?;
            Self::from_toml(&raw_string)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Parse a config from toml text; missing keys take their defaults
    pub fn from_toml(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|err| Error::ParseFailed(err.to_string()))
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|err| Error::ParseFailed(err.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_err| Error::WriteFailed(path.to_path_buf()))?;
        }

        fs::write(path, config_str).map_err(|_err| Error::WriteFailed(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config = Config::from_toml(
            "[retention]\nwindow_hours = 48\n\n[retry]\nmax_retries = 1\n",
        )
        .unwrap();

        assert_eq!(config.retention.window_hours, 48);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.delay_seconds, 10);
        assert_eq!(config.probe.timeout_seconds, 10);
        assert_eq!(config.schedule.check_interval_seconds, 60);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(Config::from_toml("[probe\n"), Err(Error::ParseFailed(_))));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config");

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config.server.port, 8080);

        let written = dir.path().join("nested/config.toml");
        assert!(written.exists());
        let reread = Config::from_config(Some(&written)).unwrap();
        assert_eq!(reread.database.path, config.database.path);
    }

    #[test]
    fn policies_follow_config_values() {
        let config = Config::default();
        let retry = config.retry.policy();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.delay, Duration::from_secs(10));
        assert_eq!(config.retention.policy().window_hours, 24);
        assert_eq!(config.probe.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn display_lists_every_section() {
        let rendered = Config::default().to_string();
        for section in ["Database", "Probe", "Schedule", "Retention", "Retry", "Server", "Logging"] {
            assert!(rendered.contains(section), "missing {section}");
        }
    }
}
