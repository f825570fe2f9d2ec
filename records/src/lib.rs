pub mod api;
pub mod client;
pub mod config;
pub mod metrics_defs;
pub mod service;
pub mod store;

#[cfg(test)]
mod testutils;

use aggregator::Aggregator;
use service::RecordService;
use std::future::Future;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum RecordsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Opens the store, connects the aggregator to the upstream catalog and
/// serves the record API until `shutdown` resolves.
pub async fn run<F>(config: config::Config, shutdown: F) -> Result<(), RecordsError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = store::open_store(&config.store)?;
    let aggregator = Aggregator::new(aggregator::build_client()?, config.upstream.clone());
    let service = RecordService::new(aggregator, store);

    let listener = TcpListener::bind(config.listener.addr()).await?;
    tracing::info!(
        addr = %config.listener.addr(),
        upstream = %config.upstream.base_url,
        "Record API listening"
    );

    api::serve(listener, service, shutdown).await?;
    tracing::info!("Record API stopped");
    Ok(())
}
