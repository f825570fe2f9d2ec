//! Record stores persist one JSON document per integer id. The SQLite store is
//! meant for deployments, the in-memory one for tests and local runs.
use crate::config::StoreType;
use aggregator::Fields;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub type RecordId = i64;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Integer-keyed document store. Every operation touches a single record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores a new document and returns the id assigned to it.
    async fn insert(&self, fields: &Fields) -> Result<RecordId, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<Fields>, StoreError>;

    /// Replaces the document of an existing record. Returns false if the
    /// record does not exist.
    async fn update(&self, id: RecordId, fields: &Fields) -> Result<bool, StoreError>;

    /// Returns false if the record does not exist.
    async fn delete(&self, id: RecordId) -> Result<bool, StoreError>;
}

pub fn open_store(store_type: &StoreType) -> Result<Arc<dyn RecordStore>, StoreError> {
    let store: Arc<dyn RecordStore> = match store_type {
        StoreType::Sqlite { path } => Arc::new(SqliteRecordStore::open(path)?),
        StoreType::Memory => {
            tracing::warn!("Using the in-memory record store, records are lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
    };
    Ok(store)
}

pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;
        tracing::info!(path = %path.display(), "Opened record store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    // Idempotent, safe to run on every start.
    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              json TEXT NOT NULL
            );
            "#,
        )?;

        Ok(SqliteRecordStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a blocking query on the connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || f(&conn.lock())).await?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, fields: &Fields) -> Result<RecordId, StoreError> {
        let json = serde_json::to_string(fields)?;
        self.with_conn(move |conn| {
            conn.execute("INSERT INTO records (json) VALUES (?1)", params![json])?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn get(&self, id: RecordId) -> Result<Option<Fields>, StoreError> {
        let json = self
            .with_conn(move |conn| {
                let json = conn
                    .query_row(
                        "SELECT json FROM records WHERE id = ?1",
                        params![id],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(json)
            })
            .await?;

        json.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn update(&self, id: RecordId, fields: &Fields) -> Result<bool, StoreError> {
        let json = serde_json::to_string(fields)?;
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE records SET json = ?1 WHERE id = ?2",
                params![json, id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM records WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }
}

#[derive(Default)]
struct MemoryRecords {
    last_id: RecordId,
    records: BTreeMap<RecordId, Fields>,
}

/// Keeps records in process memory. Ids are never reused, like the SQLite
/// store's AUTOINCREMENT.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: RwLock<MemoryRecords>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, fields: &Fields) -> Result<RecordId, StoreError> {
        let mut guard = self.inner.write();
        guard.last_id += 1;
        let id = guard.last_id;
        guard.records.insert(id, fields.clone());
        Ok(id)
    }

    async fn get(&self, id: RecordId) -> Result<Option<Fields>, StoreError> {
        Ok(self.inner.read().records.get(&id).cloned())
    }

    async fn update(&self, id: RecordId, fields: &Fields) -> Result<bool, StoreError> {
        match self.inner.write().records.get_mut(&id) {
            Some(stored) => {
                *stored = fields.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.inner.write().records.remove(&id).is_some())
    }
}
