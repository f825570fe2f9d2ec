use crate::metrics_defs::{RECORDS_CREATED, RECORDS_DELETED, RECORDS_PATCHED};
use crate::store::{RecordId, RecordStore, StoreError};
use aggregator::{AggregationError, Aggregator, FetchError, Fields};
use serde::{Deserialize, Serialize};
use shared::counter;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    #[error("person {0} not found upstream")]
    PersonNotFound(u64),

    #[error("upstream dependency failed: {0}")]
    Upstream(#[source] FetchError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<AggregationError> for ServiceError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::NotFound(person_id) => ServiceError::PersonNotFound(person_id),
            AggregationError::Failed(e) => ServiceError::Upstream(e),
        }
    }
}

/// A stored person document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

/// CRUD operations over person records.
#[derive(Clone)]
pub struct RecordService {
    aggregator: Aggregator,
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(aggregator: Aggregator, store: Arc<dyn RecordStore>) -> Self {
        RecordService { aggregator, store }
    }

    /// Builds the document for `person_id` and stores it as a new record.
    /// Nothing is stored unless the whole document could be built.
    pub async fn create(&self, person_id: u64) -> Result<RecordId, ServiceError> {
        let fields = self.aggregator.aggregate(person_id).await?;
        let id = self.store.insert(&fields).await?;

        counter!(RECORDS_CREATED).increment(1);
        tracing::info!(person_id, record_id = id, "Created record");
        Ok(id)
    }

    pub async fn read(&self, id: RecordId) -> Result<Record, ServiceError> {
        let fields = self
            .store
            .get(id)
            .await?
            .ok_or(ServiceError::RecordNotFound(id))?;
        Ok(Record { id, fields })
    }

    /// Merges `partial` into the stored document key by key. Keys missing from
    /// `partial` are kept. Values are stored verbatim.
    pub async fn patch(&self, id: RecordId, partial: Fields) -> Result<(), ServiceError> {
        let mut fields = self
            .store
            .get(id)
            .await?
            .ok_or(ServiceError::RecordNotFound(id))?;

        fields.extend(partial);

        // The record may have been deleted since it was read
        if !self.store.update(id, &fields).await? {
            return Err(ServiceError::RecordNotFound(id));
        }

        counter!(RECORDS_PATCHED).increment(1);
        tracing::debug!(record_id = id, "Patched record");
        Ok(())
    }

    pub async fn delete(&self, id: RecordId) -> Result<(), ServiceError> {
        if !self.store.delete(id).await? {
            return Err(ServiceError::RecordNotFound(id));
        }

        counter!(RECORDS_DELETED).increment(1);
        tracing::info!(record_id = id, "Deleted record");
        Ok(())
    }
}
