use crate::error::{Result, StardustError};
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// RPC server configuration
    pub rpc: RpcServerConfig,
    /// API server configuration
    pub api: ApiServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Admin credentials
    pub admin: AdminConfig,
    /// Session bootstrap configuration
    pub bootstrap: BootstrapSettings,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Port for the RPC server (default: 38450)
    pub port: u16,
    /// Host to bind to (default: 127.0.0.1)
    pub host: String,
    /// Maximum concurrent in-flight calls across all connections
    pub max_in_flight: usize,
    /// Deadline in seconds for writing a response back to the peer
    pub request_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port for the API server (default: 8080)
    pub port: u16,
    /// Host to bind to (default: 127.0.0.1)
    pub host: String,
    /// Allowed CORS origins (comma-separated, empty = localhost only)
    pub cors_origins: Vec<String>,
    /// JWT secret for token generation
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Admin username for the management API
    pub username: String,
    /// Admin password for the management API
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    /// Proxy group sessions draw from
    pub default_group: String,
    /// Rotation strategy (round_robin, random)
    pub rotation_strategy: String,
    /// Per-action deadline in seconds
    pub action_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            rpc: RpcServerConfig {
                port: get_env_or("RPC_PORT", "38450").parse().map_err(|_| {
                    StardustError::InvalidConfig("RPC_PORT must be a valid port number".into())
                })?,
                host: get_env_or("RPC_HOST", "127.0.0.1"),
                max_in_flight: get_env_or("RPC_MAX_IN_FLIGHT", "64").parse().unwrap_or(64),
                request_timeout: get_env_or("RPC_REQUEST_TIMEOUT", "10")
                    .parse()
                    .unwrap_or(10),
            },
            api: ApiServerConfig {
                port: get_env_or("API_PORT", "8080").parse().map_err(|_| {
                    StardustError::InvalidConfig("API_PORT must be a valid port number".into())
                })?,
                host: get_env_or("API_HOST", "127.0.0.1"),
                cors_origins: get_env_or("CORS_ORIGINS", "")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                jwt_secret: get_env_or("JWT_SECRET", ""),
            },
            database: DatabaseConfig {
                path: get_env_or("DB_PATH", "stardust.db"),
                max_connections: get_env_or("DB_MAX_CONNECTIONS", "5").parse().map_err(|_| {
                    StardustError::InvalidConfig("DB_MAX_CONNECTIONS must be a valid number".into())
                })?,
            },
            admin: AdminConfig {
                username: get_env_or("STARDUST_ADMIN_USER", "admin"),
                password: get_env_or("STARDUST_ADMIN_PASSWORD", "admin"),
            },
            bootstrap: BootstrapSettings {
                default_group: get_env_or("BOOTSTRAP_DEFAULT_GROUP", "default"),
                rotation_strategy: get_env_or("BOOTSTRAP_ROTATION_STRATEGY", "round_robin"),
                action_timeout: get_env_or("BOOTSTRAP_TIMEOUT", "30").parse().unwrap_or(30),
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the RPC server address
    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.rpc.host, self.rpc.port)
    }

    /// Get the API server address
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const CONFIG_ENV_KEYS: &[&str] = &[
        "RPC_PORT",
        "RPC_HOST",
        "RPC_MAX_IN_FLIGHT",
        "RPC_REQUEST_TIMEOUT",
        "API_PORT",
        "API_HOST",
        "CORS_ORIGINS",
        "JWT_SECRET",
        "DB_PATH",
        "DB_MAX_CONNECTIONS",
        "STARDUST_ADMIN_USER",
        "STARDUST_ADMIN_PASSWORD",
        "BOOTSTRAP_DEFAULT_GROUP",
        "BOOTSTRAP_ROTATION_STRATEGY",
        "BOOTSTRAP_TIMEOUT",
        "LOG_LEVEL",
        "LOG_FORMAT",
    ];

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(keys: &[&str]) -> Self {
            let saved = keys
                .iter()
                .map(|&key| {
                    let old = env::var(key).ok();
                    env::remove_var(key);
                    (key.to_string(), old)
                })
                .collect();

            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        let config = Config::from_env().unwrap();

        assert_eq!(config.rpc.port, 38450);
        assert_eq!(config.rpc.host, "127.0.0.1");
        assert_eq!(config.rpc.max_in_flight, 64);

        assert_eq!(config.api.port, 8080);
        assert!(config.api.cors_origins.is_empty());

        assert_eq!(config.database.path, "stardust.db");
        assert_eq!(config.database.max_connections, 5);

        assert_eq!(config.bootstrap.default_group, "default");
        assert_eq!(config.bootstrap.rotation_strategy, "round_robin");
        assert_eq!(config.bootstrap.action_timeout, 30);
    }

    #[test]
    fn test_config_from_env_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("RPC_PORT", "39000");
        env::set_var("RPC_HOST", "0.0.0.0");
        env::set_var("API_PORT", "9001");
        env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        env::set_var("DB_PATH", "/tmp/engine.db");
        env::set_var("BOOTSTRAP_DEFAULT_GROUP", "residential");
        env::set_var("BOOTSTRAP_ROTATION_STRATEGY", "random");

        let config = Config::from_env().unwrap();

        assert_eq!(config.rpc.port, 39000);
        assert_eq!(config.rpc.host, "0.0.0.0");
        assert_eq!(config.api.port, 9001);
        assert_eq!(
            config.api.cors_origins,
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ]
        );
        assert_eq!(config.database.path, "/tmp/engine.db");
        assert_eq!(config.bootstrap.default_group, "residential");
        assert_eq!(config.bootstrap.rotation_strategy, "random");
    }

    #[test]
    fn test_config_from_env_invalid_port() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("RPC_PORT", "not-a-port");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, StardustError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_formatters() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        let config = Config::from_env().unwrap();
        assert_eq!(config.rpc_addr(), "127.0.0.1:38450");
        assert_eq!(config.api_addr(), "127.0.0.1:8080");
    }
}
