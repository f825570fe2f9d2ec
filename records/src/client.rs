use crate::api::{CreateRequest, CreatedResponse, StatusResponse};
use crate::service::Record;
use crate::store::RecordId;
use aggregator::Fields;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Body of an error response, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMessage {
    Json(Value),
    Text(String),
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Json(value) => write!(f, "{value}"),
            ErrorMessage::Text(text) => f.write_str(text),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: ErrorMessage },

    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl ClientError {
    /// Status code of the response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::ReqwestError(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Thin wrapper over the record API. Error bodies are attached to
/// `ClientError::Http` as-is.
#[derive(Clone)]
pub struct RecordsClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for RecordsClient {
    fn default() -> Self {
        RecordsClient::new(DEFAULT_BASE_URL)
    }
}

impl RecordsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        RecordsClient::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        RecordsClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn create(&self, person_id: u64) -> Result<RecordId, ClientError> {
        let request = self
            .client
            .post(self.url("records"))
            .json(&CreateRequest { person_id });
        let created: CreatedResponse = send(request).await?;
        Ok(created.id)
    }

    pub async fn read(&self, id: RecordId) -> Result<Record, ClientError> {
        send(self.client.get(self.url(&format!("records/{id}")))).await
    }

    pub async fn patch(&self, id: RecordId, partial: &Fields) -> Result<(), ClientError> {
        let request = self
            .client
            .patch(self.url(&format!("records/{id}")))
            .json(partial);
        let _: StatusResponse = send(request).await?;
        Ok(())
    }

    pub async fn delete(&self, id: RecordId) -> Result<(), ClientError> {
        let request = self.client.delete(self.url(&format!("records/{id}")));
        let _: StatusResponse = send(request).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let text = response.text().await?;
        let message = match serde_json::from_str::<Value>(&text) {
            Ok(value) => ErrorMessage::Json(value),
            Err(_) => ErrorMessage::Text(text),
        };
        return Err(ClientError::Http {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json::<T>().await?)
}
