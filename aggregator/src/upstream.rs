use crate::config::UpstreamConfig;
use crate::errors::FetchError;
use crate::metrics_defs::UPSTREAM_FETCH;
use crate::types::Fields;
use reqwest::StatusCode;
use serde_json::Value;
use shared::counter;
use std::time::Duration;

const NOT_FOUND_KEY: &str = "detail";

/// Read-only access to the upstream catalog.
///
/// Cloning is cheap, all clones share the connection pool of the injected
/// `reqwest::Client`.
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl Upstream {
    pub fn new(client: reqwest::Client, config: UpstreamConfig) -> Self {
        Upstream { client, config }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        tracing::debug!(url, "Fetching upstream resource");
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|source| {
                counter!(UPSTREAM_FETCH, "outcome" => "error").increment(1);
                FetchError::Request {
                    url: url.to_string(),
                    source,
                }
            })?;
        counter!(UPSTREAM_FETCH, "outcome" => fetch_outcome(response.status())).increment(1);
        Ok(response)
    }

    async fn json(url: &str, response: reqwest::Response) -> Result<Value, FetchError> {
        response
            .json::<Value>()
            .await
            .map_err(|source| FetchError::InvalidJson {
                url: url.to_string(),
                source,
            })
    }

    /// Fetches a person resource. `None` means the catalog does not know the id,
    /// signalled either by a 404 or by a body carrying only `detail`.
    pub async fn fetch_person(&self, person_id: u64) -> Result<Option<Fields>, FetchError> {
        let url = self.config.person_url(person_id);
        let response = self.get(&url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(FetchError::Status { url, status }),
            _ => {}
        }

        match Self::json(&url, response).await? {
            Value::Object(person) if person.contains_key(NOT_FOUND_KEY) => Ok(None),
            Value::Object(person) => Ok(Some(person)),
            _ => Err(FetchError::UnexpectedShape {
                key: "person".into(),
            }),
        }
    }

    /// Fetches a referenced resource and returns its display name.
    pub async fn fetch_name(&self, url: &str, name_key: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Self::json(url, response)
            .await?
            .get(name_key)
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| FetchError::MissingKey {
                url: url.to_string(),
                key: name_key.to_string(),
            })
    }
}

/// Outcome tag of a fetch that got a response.
fn fetch_outcome(status: StatusCode) -> &'static str {
    match status {
        status if status.is_success() => "ok",
        StatusCode::NOT_FOUND => "not_found",
        _ => "bad_status",
    }
}
