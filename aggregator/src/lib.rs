//! Builds flattened person documents out of the upstream catalog.
//!
//! A person resource links to its homeworld, films, species, starships and
//! vehicles by URL. The aggregator resolves every link concurrently and
//! replaces it with the display name of the linked resource.

mod aggregator;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod types;
mod upstream;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use aggregator::Aggregator;
pub use errors::{AggregationError, FetchError};
pub use types::Fields;

/// Builds the HTTP client shared by every aggregation.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("holocron/", env!("CARGO_PKG_VERSION")))
        .build()
}
