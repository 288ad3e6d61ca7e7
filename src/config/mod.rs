// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{AuthConfig, Config, HttpConfig, LoggingConfig, StorageBackend, StorageConfig};

/// Secret used when nothing is configured; startup warns about it
pub const DEFAULT_JWT_SECRET: &str = "change-me";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_layers(config_path, None)
    }

    /// Defaults, then the file, then `MEALEASE_*` variables.
    /// `env` replaces the process environment when given.
    fn load_layers(
        config_path: &str,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MEALEASE")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        settings.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "dev")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("http.server_name", "MealEase/0.1")?
            .set_default("http.enable_cors", true)?
            .set_default("http.cors_allow_origin", "*")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("auth.jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("auth.token_ttl_hours", 168)? // 7 days
            .set_default("auth.bcrypt_cost", 10)?
            .set_default("storage.backend", "mongodb")?
            .set_default("storage.mongo_uri", "mongodb://127.0.0.1:27017")?
            .set_default("storage.database", "mealease")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Configuration used by unit tests: in-memory storage, cheapest bcrypt cost.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let settings = Self::defaults()
            .and_then(|builder| builder.build())
            .expect("defaults build");
        let mut cfg: Self = settings.try_deserialize().expect("defaults deserialize");
        cfg.storage.backend = StorageBackend::Memory;
        cfg.auth.bcrypt_cost = 4;
        cfg.auth.jwt_secret = "test-secret-key-that-is-long-enough".to_string();
        cfg.logging.access_log = false;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/config").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.auth.token_ttl_hours, 168);
        assert_eq!(cfg.auth.bcrypt_cost, 10);
        assert_eq!(cfg.storage.backend, StorageBackend::Mongodb);
        assert_eq!(cfg.http.max_body_size, 10_485_760);
        assert!(cfg.http.enable_cors);
        assert_eq!(cfg.logging.access_log_format, "dev");
        assert!(cfg.logging.log_file.is_none());
        assert!(cfg.performance.max_connections.is_none());
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> String {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        dir.path().join("config").to_string_lossy().into_owned()
    }

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
port = 8080

[auth]
token_ttl_hours = 24

[storage]
backend = "memory"
database = "mealease_staging"
"#,
        );

        let cfg = Config::load_layers(&path, env(&[])).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.token_ttl_hours, 24);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.database, "mealease_staging");
        // Keys the file leaves out keep their defaults
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.auth.bcrypt_cost, 10);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, "[server]\nport = 8080\nhost = \"0.0.0.0\"\n");

        let cfg = Config::load_layers(
            &path,
            env(&[
                ("MEALEASE_SERVER__PORT", "9090"),
                ("MEALEASE_STORAGE__BACKEND", "memory"),
                ("MEALEASE_AUTH__JWT_SECRET", "from-env"),
                ("UNRELATED_SERVER__PORT", "1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.auth.jwt_secret, "from-env");
    }

    #[test]
    fn test_invalid_file_value_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, "[storage]\nbackend = \"redis\"\n");
        assert!(Config::load_layers(&path, env(&[])).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::for_tests();
        cfg.server.port = 4321;
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 4321);

        cfg.server.host = "not an address".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_backend_names() {
        let backend: StorageBackend = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(backend, StorageBackend::Memory);
        assert!(serde_json::from_str::<StorageBackend>("\"redis\"").is_err());
    }
}
