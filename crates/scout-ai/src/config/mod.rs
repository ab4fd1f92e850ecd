use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub recruiting: RecruitingConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = RecruitingConfig::default();
        let recruiting = RecruitingConfig {
            batch_size: count_var("SCOUT_BATCH_SIZE", defaults.batch_size as u64)?,
            follow_up_batch_size: count_var(
                "SCOUT_SOURCE_MORE_BATCH_SIZE",
                defaults.follow_up_batch_size as u64,
            )?,
            source_on_create: flag_var("SCOUT_SOURCE_ON_CREATE", defaults.source_on_create)?,
            sourcing_timeout: seconds_var("SCOUT_SOURCING_TIMEOUT_SECS", defaults.sourcing_timeout)?,
            pitch_timeout: seconds_var("SCOUT_PITCH_TIMEOUT_SECS", defaults.pitch_timeout)?,
            outreach_timeout: seconds_var("SCOUT_OUTREACH_TIMEOUT_SECS", defaults.outreach_timeout)?,
        };

        let limits = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: count_var("SCOUT_RATE_LIMIT", u64::from(limits.max_requests))?,
            window: seconds_var("SCOUT_RATE_WINDOW_SECS", limits.window)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            recruiting,
            rate_limit,
        })
    }
}

fn number_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// A non-zero count that must fit the target integer type.
fn count_var<T: TryFrom<u64>>(key: &'static str, default: u64) -> Result<T, ConfigError> {
    let value = number_var(key, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidNumber { key });
    }
    T::try_from(value).map_err(|_| ConfigError::InvalidNumber { key })
}

fn seconds_var(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let secs = number_var(key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::InvalidNumber { key });
    }
    Ok(Duration::from_secs(secs))
}

fn flag_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { key }),
        },
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for sourcing batches and agent deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecruitingConfig {
    /// Candidates requested by the first run of a new job.
    pub batch_size: usize,
    /// Candidates requested by each later "source more" run.
    pub follow_up_batch_size: usize,
    /// Start a sourcing run as soon as a job is created.
    pub source_on_create: bool,
    pub sourcing_timeout: Duration,
    pub pitch_timeout: Duration,
    pub outreach_timeout: Duration,
}

impl Default for RecruitingConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            follow_up_batch_size: 15,
            source_on_create: true,
            sourcing_timeout: Duration::from_secs(120),
            pitch_timeout: Duration::from_secs(60),
            outreach_timeout: Duration::from_secs(60),
        }
    }
}

/// Per-client request budget for the expensive endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 12] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "SCOUT_BATCH_SIZE",
        "SCOUT_SOURCE_MORE_BATCH_SIZE",
        "SCOUT_SOURCE_ON_CREATE",
        "SCOUT_SOURCING_TIMEOUT_SECS",
        "SCOUT_PITCH_TIMEOUT_SECS",
        "SCOUT_OUTREACH_TIMEOUT_SECS",
        "SCOUT_RATE_LIMIT",
        "SCOUT_RATE_WINDOW_SECS",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().unwrap_or_else(|err| err.into_inner());
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.recruiting, RecruitingConfig::default());
        assert_eq!(config.recruiting.batch_size, 25);
        assert_eq!(config.recruiting.follow_up_batch_size, 15);
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().unwrap_or_else(|err| err.into_inner());
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_recruiting_overrides() {
        let _lock = env_guard().lock().unwrap_or_else(|err| err.into_inner());
        reset_env();
        env::set_var("SCOUT_BATCH_SIZE", "15");
        env::set_var("SCOUT_SOURCE_MORE_BATCH_SIZE", "5");
        env::set_var("SCOUT_SOURCE_ON_CREATE", "false");
        env::set_var("SCOUT_PITCH_TIMEOUT_SECS", "5");
        env::set_var("SCOUT_RATE_LIMIT", "3");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.recruiting.batch_size, 15);
        assert_eq!(config.recruiting.follow_up_batch_size, 5);
        assert!(!config.recruiting.source_on_create);
        assert_eq!(config.recruiting.pitch_timeout, Duration::from_secs(5));
        assert_eq!(config.recruiting.sourcing_timeout, Duration::from_secs(120));
        assert_eq!(config.rate_limit.max_requests, 3);
        reset_env();
    }

    #[test]
    fn rejects_zero_batch_and_bad_flags() {
        let _lock = env_guard().lock().unwrap_or_else(|err| err.into_inner());
        reset_env();
        env::set_var("SCOUT_BATCH_SIZE", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "SCOUT_BATCH_SIZE"
            })
        ));

        reset_env();
        env::set_var("SCOUT_SOURCE_ON_CREATE", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag {
                key: "SCOUT_SOURCE_ON_CREATE"
            })
        ));
        reset_env();
    }

    #[test]
    fn rate_limit_must_be_positive_and_fit_u32() {
        let _lock = env_guard().lock().unwrap_or_else(|err| err.into_inner());
        for raw in ["0", "4294967296"] {
            reset_env();
            env::set_var("SCOUT_RATE_LIMIT", raw);
            assert!(
                matches!(
                    AppConfig::load(),
                    Err(ConfigError::InvalidNumber {
                        key: "SCOUT_RATE_LIMIT"
                    })
                ),
                "SCOUT_RATE_LIMIT={raw} must be rejected"
            );
        }

        reset_env();
        env::set_var("SCOUT_RATE_LIMIT", "4294967295");
        let config = AppConfig::load().expect("u32::MAX fits");
        assert_eq!(config.rate_limit.max_requests, u32::MAX);
        reset_env();
    }

    #[test]
    fn follow_up_batch_size_rejects_zero() {
        let _lock = env_guard().lock().unwrap_or_else(|err| err.into_inner());
        reset_env();
        env::set_var("SCOUT_SOURCE_MORE_BATCH_SIZE", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "SCOUT_SOURCE_MORE_BATCH_SIZE"
            })
        ));
        reset_env();
    }
}
