use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskboard_core::EngineConfig;

pub const ENV_PREFIX: &str = "TASKBOARD";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ClientConfig {
    /// Base address of the task backend, e.g. `https://tasks.example.com/api`
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Loads configuration from `TASKBOARD_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from a file; the format follows the extension.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Engine settings matching this client: the engine gives up on a call when the client would.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            request_timeout: self.request_timeout(),
            ..Default::default()
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX).source(Some(
            vars.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        ))
    }

    mod deser_tests {
        use super::*;

        #[test]
        fn test_config_deserialize_from_toml() {
            // Arrange
            let toml_str = r#"
                api_url = "https://tasks.example.com/api"
                request_timeout_secs = 3
            "#;

            // Act
            let config: ClientConfig = toml::from_str(toml_str).unwrap();

            // Assert
            assert_eq!(config.api_url, "https://tasks.example.com/api");
            assert_eq!(config.request_timeout(), Duration::from_secs(3));
        }

        #[test]
        fn test_config_timeout_defaults_to_ten_seconds() {
            let raw = r#"api_url = "http://localhost:4000""#;

            let config: ClientConfig = toml::from_str(raw).unwrap();

            assert_eq!(config.request_timeout_secs, 10);
            assert_eq!(config, ClientConfig::new("http://localhost:4000"));
        }

        #[test]
        fn test_config_requires_api_url() {
            let result: Result<ClientConfig, _> = toml::from_str("request_timeout_secs = 5");

            assert!(result.is_err());
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_config_from_prefixed_environment() {
            let config = ClientConfig::from_environment(environment(&[
                ("TASKBOARD_API_URL", "http://backend:8080"),
                ("TASKBOARD_REQUEST_TIMEOUT_SECS", "30"),
                ("UNRELATED_API_URL", "http://elsewhere"),
            ]))
            .unwrap();

            assert_eq!(config.api_url, "http://backend:8080");
            assert_eq!(config.request_timeout_secs, 30);
        }

        #[test]
        fn test_config_from_environment_without_api_url_fails() {
            let result = ClientConfig::from_environment(environment(&[]));

            assert!(result.is_err());
        }
    }

    #[test]
    fn test_engine_config_uses_client_timeout() {
        let config = ClientConfig {
            api_url: "http://localhost".to_string(),
            request_timeout_secs: 4,
        };

        let engine_config = config.engine_config();

        assert_eq!(engine_config.request_timeout, Duration::from_secs(4));
        assert_eq!(engine_config.status_order.len(), 4);
    }
}
