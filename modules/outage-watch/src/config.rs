use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables (and an
/// optional `.env` file). Validated once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hours of the day (0-23) at which a check may run. Deduplicated,
    /// configured order preserved, never empty.
    pub hours: Vec<u32>,
    /// Municipality identifier understood by the outage API.
    pub city_sym: String,
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub interval_days: u32,

    /// Street to watch for. Blank disables matching.
    pub street_name: String,
    pub city_name: String,

    pub log_dir: PathBuf,

    /// `None` when `SMTP_HOST` is unset: notifications are disabled.
    pub smtp: Option<SmtpSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
    pub use_tls: bool,
}

impl Config {
    /// Load from the process environment, after reading `env_file` (or
    /// `./.env` when none is given, if present).
    pub fn from_env(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let hours = parse_hours(&get("HOURS").ok_or(ConfigError::Missing("HOURS"))?)?;

        let city_sym = get("CITY_SYM").ok_or(ConfigError::Missing("CITY_SYM"))?;
        let city_sym = city_sym.trim().to_string();
        if !city_sym.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::CitySymNotNumeric(city_sym));
        }

        let poll_interval_seconds = read_int(get("POLL_INTERVAL_SECONDS"), "POLL_INTERVAL_SECONDS", 30, 1, 3600)?;
        let request_timeout_seconds =
            read_int(get("REQUEST_TIMEOUT_SECONDS"), "REQUEST_TIMEOUT_SECONDS", 10, 1, 120)?;
        let interval_days = read_int(get("INTERVAL_DAYS"), "INTERVAL_DAYS", 7, 1, 365)? as u32;

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host: host.trim().to_string(),
                port: read_int(get("SMTP_PORT"), "SMTP_PORT", 587, 1, 65535)? as u16,
                username: get("SMTP_USER").unwrap_or_default(),
                password: get("SMTP_PASSWORD").unwrap_or_default(),
                from: get("SMTP_FROM").ok_or(ConfigError::Missing("SMTP_FROM"))?,
                to: split_list(&get("SMTP_TO").unwrap_or_default()),
                use_tls: read_bool(get("SMTP_USE_TLS"), "SMTP_USE_TLS", true)?,
            }),
            None => None,
        };
        if let Some(smtp) = &smtp {
            if smtp.to.is_empty() {
                return Err(ConfigError::Missing("SMTP_TO"));
            }
        }

        Ok(Self {
            hours,
            city_sym,
            poll_interval_seconds,
            request_timeout_seconds,
            interval_days,
            street_name: lookup("STREET_NAME").unwrap_or_default(),
            city_name: get("CITY_NAME").map(|s| s.trim().to_string()).unwrap_or_default(),
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs")),
            smtp,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  HOURS: {:?}", self.hours);
        tracing::info!("  CITY_SYM: {}", self.city_sym);
        tracing::info!("  POLL_INTERVAL_SECONDS: {}", self.poll_interval_seconds);
        tracing::info!("  REQUEST_TIMEOUT_SECONDS: {}", self.request_timeout_seconds);
        tracing::info!("  INTERVAL_DAYS: {}", self.interval_days);
        if self.street_name.trim().is_empty() {
            tracing::warn!("  STREET_NAME: <blank, matching disabled>");
        } else {
            tracing::info!("  STREET_NAME: {}", self.street_name.trim());
        }
        tracing::info!("  LOG_DIR: {}", self.log_dir.display());
        match &self.smtp {
            Some(smtp) => {
                tracing::info!("  SMTP_HOST: {}:{} (tls={})", smtp.host, smtp.port, smtp.use_tls);
                tracing::info!("  SMTP_USER: {}", smtp.username);
                tracing::info!("  SMTP_PASSWORD: {}", mask(&smtp.password));
                tracing::info!("  SMTP_TO: {}", smtp.to.join(", "));
            }
            None => tracing::info!("  SMTP_HOST: <not set>"),
        }
    }
}

fn mask(val: &str) -> String {
    if val.is_empty() {
        "<not set>".to_string()
    } else {
        format!("***({} chars)", val.chars().count())
    }
}

/// Parse a comma-separated list of hours, skipping empty items and
/// duplicates.
pub fn parse_hours(value: &str) -> Result<Vec<u32>, ConfigError> {
    let mut hours = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidHour(part.to_string()));
        }
        let hour: u64 = part
            .parse()
            .map_err(|_| ConfigError::InvalidHour(part.to_string()))?;
        if hour > 23 {
            return Err(ConfigError::HourOutOfRange(hour));
        }
        let hour = hour as u32;
        if !hours.contains(&hour) {
            hours.push(hour);
        }
    }
    if hours.is_empty() {
        return Err(ConfigError::NoHours);
    }
    Ok(hours)
}

fn read_int(
    raw: Option<String>,
    name: &'static str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let raw = raw.trim();
    let value: u64 = raw
        .parse()
        .ok()
        .filter(|_| raw.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| ConfigError::NotInteger {
            name,
            value: raw.to_string(),
        })?;
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn read_bool(raw: Option<String>, name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::NotBool { name, value: raw }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load(&[("HOURS", "7, 19"), ("CITY_SYM", "0986283")]).unwrap();
        assert_eq!(config.hours, vec![7, 19]);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.interval_days, 7);
        assert_eq!(config.street_name, "");
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(config.smtp.is_none());
    }

    #[test]
    fn hours_are_deduplicated_in_order() {
        assert_eq!(parse_hours("19,7, ,19,0").unwrap(), vec![19, 7, 0]);
    }

    #[test]
    fn hours_are_validated() {
        assert_eq!(parse_hours("7,24"), Err(ConfigError::HourOutOfRange(24)));
        assert_eq!(parse_hours("7,-1"), Err(ConfigError::InvalidHour("-1".into())));
        assert_eq!(parse_hours(" , "), Err(ConfigError::NoHours));
    }

    #[test]
    fn required_vars_fail_fast() {
        assert_eq!(load(&[("CITY_SYM", "1")]).unwrap_err(), ConfigError::Missing("HOURS"));
        assert_eq!(load(&[("HOURS", "7")]).unwrap_err(), ConfigError::Missing("CITY_SYM"));
        assert_eq!(
            load(&[("HOURS", "7"), ("CITY_SYM", "09a")]).unwrap_err(),
            ConfigError::CitySymNotNumeric("09a".into())
        );
    }

    #[test]
    fn integer_ranges_are_enforced() {
        let err = load(&[("HOURS", "7"), ("CITY_SYM", "1"), ("POLL_INTERVAL_SECONDS", "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                name: "POLL_INTERVAL_SECONDS",
                value: 0,
                min: 1,
                max: 3600
            }
        );

        let err = load(&[("HOURS", "7"), ("CITY_SYM", "1"), ("INTERVAL_DAYS", "+3")]).unwrap_err();
        assert!(matches!(err, ConfigError::NotInteger { name: "INTERVAL_DAYS", .. }));
    }

    #[test]
    fn smtp_settings_are_loaded_when_host_is_set() {
        let config = load(&[
            ("HOURS", "7"),
            ("CITY_SYM", "1"),
            ("SMTP_HOST", "smtp.example.test"),
            ("SMTP_PORT", "2525"),
            ("SMTP_FROM", "watch@example.test"),
            ("SMTP_TO", "a@example.test, b@example.test"),
            ("SMTP_USE_TLS", "no"),
        ])
        .unwrap();

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.to, vec!["a@example.test", "b@example.test"]);
        assert!(!smtp.use_tls);
    }

    #[test]
    fn smtp_requires_recipients() {
        let err = load(&[
            ("HOURS", "7"),
            ("CITY_SYM", "1"),
            ("SMTP_HOST", "smtp.example.test"),
            ("SMTP_FROM", "watch@example.test"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("SMTP_TO"));
    }
}
