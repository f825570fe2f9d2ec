use records::config::Config as RecordsConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "holocron".into()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default filter, `RUST_LOG` takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            sentry_dsn: None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(flatten)]
    pub records: RecordsConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.records.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] records::config::ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use records::config::StoreType;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 8080
            upstream:
                base_url: https://swapi.dev/api
                timeout_secs: 5
            store:
                type: sqlite
                path: /var/lib/holocron/records.db
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                level: debug
                sentry_dsn: https://key@sentry.example.com/1
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.records.listener.port, 8080);
        assert_eq!(config.records.upstream.timeout_secs, 5);
        assert_eq!(
            config.records.store,
            StoreType::Sqlite {
                path: "/var/lib/holocron/records.db".into()
            }
        );
        assert_eq!(
            config.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125,
                prefix: "holocron".into(),
            })
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.sentry_dsn.is_some());
    }

    #[test]
    fn minimal_config() {
        let tmp = write_tmp_file("store:\n  type: memory\n");
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.metrics.is_none());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.records.store, StoreType::Memory);
    }

    #[test]
    fn invalid_config() {
        let tmp = write_tmp_file("listener:\n  host: 127.0.0.1\n  port: 0\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ValidationError(_))
        ));

        let tmp = write_tmp_file("listener: [not, a, mapping]\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));

        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/holocron.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
