use crate::config::UpstreamConfig;
use crate::errors::{AggregationError, FetchError};
use crate::metrics_defs::{
    AGGREGATION_DURATION, AGGREGATION_FAILED, AGGREGATION_NOT_FOUND, AGGREGATION_SUCCESS,
};
use crate::types::{Cardinality, Fields, REFERENCES, Reference, base_fields, join_names};
use crate::upstream::Upstream;
use serde_json::Value;
use shared::{counter, histogram};
use std::time::Instant;
use tokio::task::JoinSet;

/// Builds flattened person documents from the upstream catalog.
#[derive(Clone)]
pub struct Aggregator {
    upstream: Upstream,
}

impl Aggregator {
    pub fn new(client: reqwest::Client, config: UpstreamConfig) -> Self {
        Aggregator {
            upstream: Upstream::new(client, config),
        }
    }

    /// Fetches the person and every resource it references, and returns the
    /// flattened document.
    ///
    /// All references are resolved concurrently. The document is only built
    /// once every fetch succeeded, the first failure aborts the outstanding
    /// fetches and is returned as `AggregationError::Failed`.
    pub async fn aggregate(&self, person_id: u64) -> Result<Fields, AggregationError> {
        let start = Instant::now();
        let result = self.build(person_id).await;
        histogram!(AGGREGATION_DURATION).record(start.elapsed().as_secs_f64());

        match &result {
            Ok(fields) => {
                counter!(AGGREGATION_SUCCESS).increment(1);
                tracing::debug!(person_id, keys = fields.len(), "Aggregated person");
            }
            Err(AggregationError::NotFound(_)) => {
                counter!(AGGREGATION_NOT_FOUND).increment(1);
                tracing::info!(person_id, "Person not found upstream");
            }
            Err(AggregationError::Failed(e)) => {
                counter!(AGGREGATION_FAILED).increment(1);
                tracing::warn!(person_id, error = %e, "Aggregation failed");
            }
        }

        result
    }

    async fn build(&self, person_id: u64) -> Result<Fields, AggregationError> {
        let person = self
            .upstream
            .fetch_person(person_id)
            .await?
            .ok_or(AggregationError::NotFound(person_id))?;

        let pending = REFERENCES
            .iter()
            .map(|reference| -> Result<_, FetchError> {
                Ok((*reference, reference_urls(&person, reference)?))
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        let resolved = self.resolve_all(pending).await?;

        let mut fields = base_fields(&person, person_id);
        for (key, value) in resolved {
            fields.insert(key.to_string(), Value::String(value));
        }

        Ok(fields)
    }

    /// Resolves every reference in its own task and joins them all.
    async fn resolve_all(
        &self,
        pending: Vec<(Reference, Vec<String>)>,
    ) -> Result<Vec<(&'static str, String)>, FetchError> {
        let mut join_set = JoinSet::new();

        for (reference, urls) in pending {
            let upstream = self.upstream.clone();
            join_set.spawn(async move {
                let names = fetch_names(&upstream, urls, reference.name_key).await?;
                Ok::<_, FetchError>((reference.key, join_names(&names)))
            });
        }

        let mut resolved = Vec::with_capacity(join_set.len());

        // Returning early drops the join set, which aborts the remaining tasks.
        while let Some(join_result) = join_set.join_next().await {
            let result = join_result.map_err(|e| {
                tracing::error!("Task panicked: {}", e);
                FetchError::TaskFailed(e.to_string())
            })?;
            resolved.push(result?);
        }

        Ok(resolved)
    }
}

/// Reads the URL(s) of a reference field out of the person resource.
fn reference_urls(person: &Fields, reference: &Reference) -> Result<Vec<String>, FetchError> {
    let shape_error = || FetchError::UnexpectedShape {
        key: reference.key.to_string(),
    };

    let value = person.get(reference.key).ok_or_else(shape_error)?;

    match reference.cardinality {
        Cardinality::Single => value
            .as_str()
            .map(|url| vec![url.to_string()])
            .ok_or_else(shape_error),
        Cardinality::List => value
            .as_array()
            .ok_or_else(shape_error)?
            .iter()
            .map(|url| url.as_str().map(String::from).ok_or_else(shape_error))
            .collect(),
    }
}

/// Fetches the display name of every URL concurrently. Names come back in the
/// order of `urls`, regardless of which fetch finished first.
async fn fetch_names(
    upstream: &Upstream,
    urls: Vec<String>,
    name_key: &'static str,
) -> Result<Vec<String>, FetchError> {
    let mut names: Vec<Option<String>> = vec![None; urls.len()];
    let mut join_set = JoinSet::new();

    for (index, url) in urls.into_iter().enumerate() {
        let upstream = upstream.clone();
        join_set.spawn(async move { (index, upstream.fetch_name(&url, name_key).await) });
    }

    while let Some(join_result) = join_set.join_next().await {
        let (index, result) = join_result.map_err(|e| FetchError::TaskFailed(e.to_string()))?;
        names[index] = Some(result?);
    }

    Ok(names.into_iter().flatten().collect())
}
