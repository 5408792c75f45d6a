use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "cleanit.toml",
    "config/cleanit.toml",
    "crates/config/cleanit.toml",
    "../cleanit.toml",
    "../config/cleanit.toml",
    "../../cleanit.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://cleanit.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Account and session settings.
///
/// Accounts are keyed by a synthesized address `{login_id}@{account_email_domain}`.
///
/// ```
/// use cleanit_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.account_email_domain, "cleanit.temp");
/// assert_eq!(auth.session_ttl_seconds, 86_400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_email_domain")]
    pub account_email_domain: String,
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }

    fn default_email_domain() -> String {
        "cleanit.temp".to_string()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            account_email_domain: Self::default_email_domain(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Refuse to complete a job until both before and after photos are attached.
    #[serde(default = "JobsConfig::default_require_photos")]
    pub require_photos_for_completion: bool,
}

impl JobsConfig {
    const fn default_require_photos() -> bool {
        true
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            require_photos_for_completion: Self::default_require_photos(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "EventsConfig::default_capacity")]
    pub channel_capacity: usize,
    /// How often a live feed re-checks its session; the socket closes once it is gone.
    #[serde(default = "EventsConfig::default_session_check")]
    pub session_check_seconds: u64,
}

impl EventsConfig {
    const fn default_capacity() -> usize {
        256
    }

    const fn default_session_check() -> u64 {
        30
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: Self::default_capacity(),
            session_check_seconds: Self::default_session_check(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use cleanit_config::load;
///
/// std::env::remove_var("CLEANIT_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);
    let channel_capacity = i64::try_from(defaults.events.channel_capacity).unwrap_or(i64::MAX);
    let session_check = i64::try_from(defaults.events.session_check_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default(
            "auth.account_email_domain",
            defaults.auth.account_email_domain.clone(),
        )?
        .set_default(
            "jobs.require_photos_for_completion",
            defaults.jobs.require_photos_for_completion,
        )?
        .set_default("events.channel_capacity", channel_capacity)?
        .set_default("events.session_check_seconds", session_check)?;

    let environment_overrides = config::Environment::with_prefix("CLEANIT").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("CLEANIT_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via CLEANIT_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }
    if config.events.channel_capacity == 0 {
        config.events.channel_capacity = EventsConfig::default_capacity();
    }
    if config.events.session_check_seconds == 0 {
        config.events.session_check_seconds = EventsConfig::default_session_check();
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
