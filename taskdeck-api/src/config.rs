//! Configuration management for the API server
//!
//! Everything is read once at startup from environment variables (a `.env`
//! file is loaded first when present).
//!
//! # Environment Variables
//!
//! | Variable | Default |
//! |---|---|
//! | `API_HOST` | `0.0.0.0` |
//! | `API_PORT` | `3000` |
//! | `CORS_ORIGINS` | `*` (comma-separated list) |
//! | `MAX_BODY_BYTES` | `10485760` |
//! | `DATABASE_URL` | required |
//! | `DATABASE_MAX_CONNECTIONS` | `10` |
//! | `REDIS_HOST` | `redis` |
//! | `REDIS_PORT` | `6379` |
//! | `CACHE_TTL_SECS` | `30` |
//! | `CACHE_FAIL_OPEN` | `true` |
//! | `JWT_SECRET` | required, at least 32 characters |
//! | `STORAGE_URL` / `STORAGE_KEY` | unset (storage disabled) |
//! | `STORAGE_BUCKET` | `avatars` |
//! | `STORAGE_TIMEOUT_SECS` | `10` |
//! | `SEED_DEFAULT_USER` | `false` |
//! | `LOG_FORMAT` | `pretty` (`pretty` or `json`) |
//!
//! # Example
//!
//! ```no_run
//! use taskdeck_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use taskdeck_shared::storage::StorageConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    pub storage: StorageSettings,

    /// Create the development user at startup when no user exists
    pub seed_default_user: bool,

    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Redis location
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

/// Task list cache policy
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of the cached task list
    pub ttl_secs: u64,

    /// Serve from the database when the cache is unreachable
    pub fail_open: bool,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Object storage settings
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub url: Option<String>,
    pub key: Option<String>,
    pub bucket: String,

    /// Timeout for uploads and remote avatar fetches
    pub timeout_secs: u64,
}

impl StorageSettings {
    /// Storage connection settings, if both URL and key are set
    pub fn storage_config(&self) -> Option<StorageConfig> {
        match (&self.url, &self.key) {
            (Some(url), Some(key)) => Some(StorageConfig {
                url: url.clone(),
                key: key.clone(),
                bucket: self.bucket.clone(),
                timeout_secs: self.timeout_secs,
            }),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format '{}'", other)),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from any variable source
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url =
            get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret =
            get("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 characters long");
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "API_PORT", 3000)?,
                cors_origins,
                max_body_bytes: parse_or(&get, "MAX_BODY_BYTES", 10 * 1024 * 1024)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            redis: RedisConfig {
                host: get("REDIS_HOST").unwrap_or_else(|| "redis".to_string()),
                port: parse_or(&get, "REDIS_PORT", 6379)?,
            },
            cache: CacheConfig {
                ttl_secs: parse_or(&get, "CACHE_TTL_SECS", 30)?,
                fail_open: parse_bool_or(&get, "CACHE_FAIL_OPEN", true)?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            storage: StorageSettings {
                url: get("STORAGE_URL"),
                key: get("STORAGE_KEY"),
                bucket: get("STORAGE_BUCKET").unwrap_or_else(|| "avatars".to_string()),
                timeout_secs: parse_or(&get, "STORAGE_TIMEOUT_SECS", 10)?,
            },
            seed_default_user: parse_bool_or(&get, "SEED_DEFAULT_USER", false)?,
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", name, raw)),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, name: &str, default: bool) -> anyhow::Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => bail!("invalid boolean for {}: '{}'", name, raw),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let mut map: HashMap<String, String> = HashMap::from([
            ("DATABASE_URL".to_string(), "postgresql://localhost/test".to_string()),
            ("JWT_SECRET".to_string(), SECRET.to_string()),
        ]);
        for (k, v) in vars {
            map.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.api.max_body_bytes, 10_485_760);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.redis.host, "redis");
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.cache.ttl(), Duration::from_secs(30));
        assert!(config.cache.fail_open);
        assert_eq!(config.storage.bucket, "avatars");
        assert!(config.storage.storage_config().is_none());
        assert!(!config.seed_default_user);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("API_PORT", "8080"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("CACHE_FAIL_OPEN", "false"),
            ("STORAGE_URL", "https://project.supabase.co"),
            ("STORAGE_KEY", "service-key"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.api.port, 8080);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.cache.fail_open);
        assert_eq!(config.log_format, LogFormat::Json);

        let storage = config.storage.storage_config().unwrap();
        assert_eq!(storage.bucket, "avatars");
        assert_eq!(storage.timeout_secs, 10);
    }

    #[test]
    fn test_storage_requires_url_and_key() {
        let config = load(&[("STORAGE_URL", "https://project.supabase.co"), ("STORAGE_KEY", " ")]).unwrap();
        assert!(config.storage.storage_config().is_none());
    }

    #[test]
    fn test_required_and_invalid_values() {
        assert!(Config::from_lookup(|_| None).is_err());
        assert!(load(&[("JWT_SECRET", "short")]).is_err());
        assert!(load(&[("API_PORT", "not-a-port")]).is_err());
        assert!(load(&[("CACHE_FAIL_OPEN", "maybe")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
