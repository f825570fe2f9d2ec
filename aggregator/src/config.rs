use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Upstream base URL must use http or https, got {0}")]
    InvalidScheme(String),
}

/// Location of the upstream catalog API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Base URL of the catalog, person resources live under `{base_url}/people/{id}/`
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Timeout applied to every individual upstream fetch
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> Url {
    Url::parse("https://swapi.dev/api").expect("static URL is valid")
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        match self.base_url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::InvalidScheme(other.to_string())),
        }
    }

    pub fn person_url(&self, person_id: u64) -> String {
        format!(
            "{}/people/{}/",
            self.base_url.as_str().trim_end_matches('/'),
            person_id
        )
    }
}
