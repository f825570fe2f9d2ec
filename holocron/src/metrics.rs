use crate::config::MetricsConfig;
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use shared::metrics_defs::{MetricDef, describe_all, duplicate_names};

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
    #[error("metric defined more than once: {0:?}")]
    DuplicateMetrics(Vec<&'static str>),
}

fn all_metrics() -> Vec<MetricDef> {
    aggregator::metrics_defs::ALL_METRICS
        .iter()
        .chain(records::metrics_defs::ALL_METRICS)
        .copied()
        .collect()
}

/// Sends metrics to StatsD if configured. Without a config the `metrics` macros
/// stay no-ops.
pub fn init(config: Option<&MetricsConfig>) -> Result<(), MetricsError> {
    let defs = all_metrics();
    let duplicates = duplicate_names(&defs);
    if !duplicates.is_empty() {
        return Err(MetricsError::DuplicateMetrics(duplicates));
    }

    let Some(config) = config else {
        tracing::info!("No metrics backend configured");
        return Ok(());
    };

    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))?;
    ::metrics::set_global_recorder(recorder).map_err(|_| MetricsError::RecorderAlreadySet)?;
    describe_all(&defs);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
