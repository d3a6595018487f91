use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::oracle::SatelliteFamily;

pub const MAIL_USERNAME_VAR: &str = "MAIL_USERNAME";
pub const MAIL_PASSWORD_VAR: &str = "MAIL_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid duration {value:?}: {message}")]
    Duration { value: String, message: String },
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_url")]
    pub url: String,
    #[serde(default)]
    pub satellite: SatelliteFamily,
    /// Request timeout, e.g. `30s`.
    #[serde(default = "default_oracle_timeout")]
    pub timeout: String,
    /// Days ahead covered by user-triggered fetches.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: default_oracle_url(),
            satellite: SatelliteFamily::default(),
            timeout: default_oracle_timeout(),
            lookahead_days: default_lookahead_days(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(self.timeout.trim()).map_err(|e| ConfigError::Duration {
            value: self.timeout.clone(),
            message: e.to_string(),
        })
    }
}

fn default_oracle_url() -> String {
    "https://landsat.usgs.gov/landsat_acquisition_api/v1/acqs".to_string()
}

fn default_oracle_timeout() -> String {
    "30s".to_string()
}

fn default_lookahead_days() -> u32 {
    16
}

pub const MAX_LOOKAHEAD_DAYS: u32 = 366;

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    pub from: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_true")]
    pub require_auth: bool,
}

#[derive(Debug, Clone)]
pub struct MailCredentials {
    pub username: String,
    pub password: String,
}

impl MailConfig {
    /// SMTP credentials from `MAIL_USERNAME` / `MAIL_PASSWORD`.
    pub fn credentials(&self) -> Result<Option<MailCredentials>, ConfigError> {
        self.credentials_from(|name| std::env::var(name).ok())
    }

    fn credentials_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<MailCredentials>, ConfigError> {
        match (lookup(MAIL_USERNAME_VAR), lookup(MAIL_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Ok(Some(MailCredentials { username, password })),
            (None, _) if self.require_auth => Err(ConfigError::MissingCredential(MAIL_USERNAME_VAR)),
            (_, None) if self.require_auth => Err(ConfigError::MissingCredential(MAIL_PASSWORD_VAR)),
            _ => Ok(None),
        }
    }
}

fn default_mail_port() -> u16 {
    587
}

fn default_subject() -> String {
    "Upcoming Landsat Pass".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
    /// Scan once immediately instead of waiting a full interval.
    #[serde(default)]
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            run_on_start: false,
        }
    }
}

/// Longest accepted scan interval, one year.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }
}

fn default_interval_hours() -> u64 {
    24
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub key: String,
    pub name: String,
    pub email: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    SubmitLocation,
    ListLocations,
    FetchOverpasses,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_hours == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.interval_hours must be greater than zero".into(),
            ));
        }
        if self.scheduler.interval_hours > MAX_INTERVAL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "scheduler.interval_hours must be at most {}",
                MAX_INTERVAL_HOURS
            )));
        }
        if self.oracle.lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(ConfigError::Invalid(format!(
                "oracle.lookahead_days must be at most {}",
                MAX_LOOKAHEAD_DAYS
            )));
        }
        self.oracle.timeout()?;
        Ok(())
    }

    pub fn find_user(&self, key: &str) -> Option<&User> {
        self.users.iter().find(|u| u.key == key)
    }

    /// User name to email pairs for owner resolution.
    pub fn user_emails(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.users.iter().map(|u| (u.name.clone(), u.email.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
mail:
  host: smtp.example.com
  from: alerts@example.com
storage:
  base_folder: /var/lib/landsat-alert
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.oracle.satellite, SatelliteFamily::Landsat89);
        assert_eq!(config.oracle.timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.oracle.lookahead_days, 16);
        assert_eq!(config.mail.port, 587);
        assert!(config.mail.tls);
        assert_eq!(config.mail.subject, "Upcoming Landsat Pass");
        assert_eq!(config.scheduler.interval(), Duration::from_secs(24 * 3600));
        assert!(!config.scheduler.run_on_start);
        assert!(config.users.is_empty());
    }

    #[test]
    fn full_config() {
        let yaml = r#"
web:
  bind: 127.0.0.1:9000
oracle:
  url: http://localhost:1234/acqs
  satellite: landsat_9
  timeout: 5s
mail:
  host: smtp.example.com
  port: 465
  from: Alerts <alerts@example.com>
  require_auth: false
scheduler:
  interval_hours: 6
  run_on_start: true
storage:
  base_folder: ./data
users:
  - key: secret
    name: alice
    email: alice@example.com
    permissions: [submit_location, list_locations]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.oracle.satellite, SatelliteFamily::Landsat9);
        assert_eq!(config.oracle.timeout().unwrap(), Duration::from_secs(5));
        assert_eq!(config.scheduler.interval(), Duration::from_secs(6 * 3600));
        let user = config.find_user("secret").unwrap();
        assert!(user.permissions.contains(&Permission::SubmitLocation));
        assert!(!user.permissions.contains(&Permission::FetchOverpasses));
        assert!(config.find_user("other").is_none());
        let emails: Vec<_> = config.user_emails().collect();
        assert_eq!(emails, vec![("alice".to_string(), "alice@example.com".to_string())]);
    }

    #[test]
    fn zero_interval_rejected() {
        let yaml = format!("{}scheduler:\n  interval_hours: 0\n", MINIMAL);
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn oversized_interval_rejected() {
        let yaml = format!(
            "{}scheduler:\n  interval_hours: 18446744073709551615\n",
            MINIMAL
        );
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::Invalid(_))));

        let yaml = format!("{}scheduler:\n  interval_hours: 8785\n", MINIMAL);
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::Invalid(_))));

        let yaml = format!("{}scheduler:\n  interval_hours: 8784\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.scheduler.interval(), Duration::from_secs(8784 * 3600));
    }

    #[test]
    fn oversized_lookahead_rejected() {
        let yaml = format!("{}oracle:\n  lookahead_days: 4294967295\n", MINIMAL);
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_timeout_rejected() {
        let yaml = format!("{}oracle:\n  timeout: soon\n", MINIMAL);
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(ConfigError::Duration { .. })
        ));
    }

    #[test]
    fn credentials_required_by_default() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        let missing = config.mail.credentials_from(|_| None);
        assert!(matches!(
            missing,
            Err(ConfigError::MissingCredential(MAIL_USERNAME_VAR))
        ));

        let only_user = config.mail.credentials_from(|name| {
            (name == MAIL_USERNAME_VAR).then(|| "user".to_string())
        });
        assert!(matches!(
            only_user,
            Err(ConfigError::MissingCredential(MAIL_PASSWORD_VAR))
        ));

        let both = config
            .mail
            .credentials_from(|name| Some(format!("{}-value", name)))
            .unwrap()
            .unwrap();
        assert_eq!(both.username, "MAIL_USERNAME-value");
        assert_eq!(both.password, "MAIL_PASSWORD-value");
    }

    #[test]
    fn anonymous_mail_allowed_when_configured() {
        let mut config = Config::from_yaml(MINIMAL).unwrap();
        config.mail.require_auth = false;
        assert!(config.mail.credentials_from(|_| None).unwrap().is_none());
    }
}
