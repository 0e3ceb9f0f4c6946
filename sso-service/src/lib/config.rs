use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub token: TokenConfig,
    pub password: PasswordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub grpc_port: u16,
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Per-request deadline applied by the gRPC server.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub ttl_minutes: i64,
}

impl TokenConfig {
    /// Lifetime of issued access tokens.
    ///
    /// # Errors
    /// * `ConfigError::Message` - `ttl_minutes` does not fit a duration
    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_minutes(self.ttl_minutes).ok_or_else(|| {
            ConfigError::Message(format!(
                "token.ttl_minutes out of range: {}",
                self.ttl_minutes
            ))
        })
    }
}

/// Argon2id cost used for newly hashed passwords.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, TOKEN__TTL_MINUTES, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=sqlite://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
