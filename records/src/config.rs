use aggregator::config::UpstreamConfig;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Store path cannot be empty")]
    EmptyStorePath,

    #[error("Upstream configuration error: {0}")]
    Upstream(#[from] aggregator::config::ValidationError),
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreType {
    Sqlite { path: PathBuf },
    Memory,
}

impl Default for StoreType {
    fn default() -> Self {
        StoreType::Sqlite {
            path: "holocron.db".into(),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Record service configuration
#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub store: StoreType,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.upstream.validate()?;
        if let StoreType::Sqlite { path } = &self.store
            && path.as_os_str().is_empty()
        {
            return Err(ValidationError::EmptyStorePath);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 9090
            upstream:
                base_url: http://catalog.internal/api
                timeout_secs: 3
            store:
                type: sqlite
                path: /var/lib/holocron/records.db
            "#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listener.addr(), "0.0.0.0:9090");
        assert_eq!(config.upstream.timeout_secs, 3);
        assert_eq!(
            config.store,
            StoreType::Sqlite {
                path: "/var/lib/holocron/records.db".into()
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("store:\n  type: memory\n").unwrap();
        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.upstream, UpstreamConfig::default());
        assert_eq!(config.store, StoreType::Memory);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        config.listener.port = 8080;
        config.store = StoreType::Sqlite { path: "".into() };
        assert_eq!(config.validate(), Err(ValidationError::EmptyStorePath));

        config.store = StoreType::Memory;
        config.upstream.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Upstream(_))
        ));
    }

    #[test]
    fn test_unknown_store_type() {
        assert!(serde_yaml::from_str::<Config>("store:\n  type: postgres\n").is_err());
    }
}
