use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Timeout for acquiring a connection and for the initial ping, in seconds.
    pub connect_timeout_secs: u64,
    /// Per-statement timeout applied to every store call, in seconds.
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    /// Token-bucket refill rate, requests per second per client IP.
    pub rate_limit_rps: f64,
    /// Token-bucket burst capacity per client IP.
    pub rate_limit_burst: u32,
    /// Grace period for in-flight requests and background work on shutdown.
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
    pub authentication_token_ttl_hours: i64,
    pub activation_token_ttl_hours: i64,
    pub password_reset_token_ttl_mins: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_QUERY_TIMEOUT_SECS") {
            self.database.query_timeout_secs = v.parse().unwrap_or(self.database.query_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_RPS") {
            self.api.rate_limit_rps = v.parse().unwrap_or(self.api.rate_limit_rps);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_BURST") {
            self.api.rate_limit_burst = v.parse().unwrap_or(self.api.rate_limit_burst);
        }
        if let Ok(v) = env::var("API_SHUTDOWN_GRACE_SECS") {
            self.api.shutdown_grace_secs = v.parse().unwrap_or(self.api.shutdown_grace_secs);
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_BCRYPT_COST") {
            self.auth.bcrypt_cost = v.parse().unwrap_or(self.auth.bcrypt_cost);
        }
        if let Ok(v) = env::var("AUTH_TOKEN_TTL_HOURS") {
            self.auth.authentication_token_ttl_hours =
                v.parse().unwrap_or(self.auth.authentication_token_ttl_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 5,
                query_timeout_secs: 3,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_rps: 2.0,
                rate_limit_burst: 4,
                shutdown_grace_secs: 30,
            },
            auth: AuthConfig {
                bcrypt_cost: 12,
                authentication_token_ttl_hours: 24,
                activation_token_ttl_hours: 72,
                password_reset_token_ttl_mins: 45,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connect_timeout_secs: 5,
                query_timeout_secs: 3,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_rps: 2.0,
                rate_limit_burst: 4,
                shutdown_grace_secs: 30,
            },
            auth: AuthConfig {
                bcrypt_cost: 12,
                authentication_token_ttl_hours: 24,
                activation_token_ttl_hours: 72,
                password_reset_token_ttl_mins: 45,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connect_timeout_secs: 5,
                query_timeout_secs: 3,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_rps: 2.0,
                rate_limit_burst: 4,
                shutdown_grace_secs: 30,
            },
            auth: AuthConfig {
                bcrypt_cost: 12,
                authentication_token_ttl_hours: 4,
                activation_token_ttl_hours: 72,
                password_reset_token_ttl_mins: 45,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_disables_rate_limiting() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.database.query_timeout_secs, 3);
    }

    #[test]
    fn production_enables_rate_limiting() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_rps, 2.0);
        assert_eq!(config.api.rate_limit_burst, 4);
    }
}
