//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use wholesale_auth::{NewUser, Role};
use wholesale_infra::StockPolicy;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_JWT_EXPIRE: &str = "30d";
const DEFAULT_ADMIN_NAME: &str = "Administrator";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Lifetime of tokens issued at sign-in.
    pub jwt_ttl: Duration,
    /// First admin account, created at startup when no admin exists.
    pub admin_seed: Option<NewUser>,
    pub policy: StockPolicy,
    /// Allowed browser origin; any origin when unset.
    pub cors_origin: Option<String>,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl ApiConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = StockPolicy::default();
        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            bind_addr: parse("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?,
            jwt_secret,
            jwt_ttl: parse_ttl(get("JWT_EXPIRE").as_deref().unwrap_or(DEFAULT_JWT_EXPIRE))?,
            admin_seed: admin_seed(&get)?,
            policy: StockPolicy {
                low_stock_threshold: parse("LOW_STOCK_THRESHOLD", get("LOW_STOCK_THRESHOLD"), Some(defaults.low_stock_threshold))?,
                near_expiry_days: parse("NEAR_EXPIRY_DAYS", get("NEAR_EXPIRY_DAYS"), Some(defaults.near_expiry_days))?,
            },
            cors_origin: get("CORS_ORIGIN"),
            database_url: get("DATABASE_URL"),
            db_max_connections: parse(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                Some(DEFAULT_DB_MAX_CONNECTIONS),
            )?,
        })
    }
}

/// `30d`, `12h`, `45m`, `90s` or a bare number of seconds.
fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var: "JWT_EXPIRE",
        value: raw.to_string(),
        reason: reason.into(),
    };

    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(at) => raw.split_at(at),
        None => (raw, "s"),
    };
    let amount: i64 = digits.parse().map_err(|_| invalid("expected a number with an optional d/h/m/s unit"))?;
    let ttl = match unit {
        "d" => Duration::try_days(amount),
        "h" => Duration::try_hours(amount),
        "m" => Duration::try_minutes(amount),
        "s" => Duration::try_seconds(amount),
        _ => return Err(invalid("unknown unit")),
    }
    .ok_or_else(|| invalid("out of range"))?;

    if ttl <= Duration::zero() {
        return Err(invalid("must be positive"));
    }
    Ok(ttl)
}

fn admin_seed(get: &impl Fn(&str) -> Option<String>) -> Result<Option<NewUser>, ConfigError> {
    match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
        (Some(email), Some(password)) => Ok(Some(NewUser {
            name: get("ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            email,
            password,
            role: Role::Admin,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Invalid {
            var: "ADMIN_PASSWORD",
            value: String::new(),
            reason: "required when ADMIN_EMAIL is set".into(),
        }),
        (None, Some(_)) => Err(ConfigError::Invalid {
            var: "ADMIN_EMAIL",
            value: String::new(),
            reason: "required when ADMIN_PASSWORD is set".into(),
        }),
    }
}

fn parse<T>(var: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => default.ok_or_else(|| ConfigError::Invalid {
            var,
            value: String::new(),
            reason: "missing".into(),
        }),
    }
}
