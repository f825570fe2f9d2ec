use thiserror::Error;

/// Failure of a single upstream fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} has no string field `{key}`")]
    MissingKey { url: String, key: String },

    #[error("field `{key}` of the person resource has an unexpected shape")]
    UnexpectedShape { key: String },

    #[error("resolution task failed: {0}")]
    TaskFailed(String),
}

/// Outcome of an aggregation that did not produce a document.
///
/// `NotFound` is a legitimate result, the caller decides that nothing gets
/// created. `Failed` means some upstream fetch broke and the whole document is
/// discarded.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("person {0} not found upstream")]
    NotFound(u64),

    #[error("aggregation failed: {0}")]
    Failed(#[from] FetchError),
}
