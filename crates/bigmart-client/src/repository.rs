//! # Entity Repositories
//!
//! Typed access to one collection: validate first, then write.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Repository<T>                                   │
//! │                                                                         │
//! │  Screen form                                                            │
//! │      │  create(&product)                                               │
//! │      ▼                                                                  │
//! │  normalized() ──► validate() ──✗──► ClientError::Core(Validation)       │
//! │      │                              (store never called)               │
//! │      ✓                                                                  │
//! │      ▼                                                                  │
//! │  serde_json::to_value ──► RemoteStore::append("products", doc)         │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                           generated key                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use bigmart_core::rows::{project_value, Record, Row};
use bigmart_core::Entity;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::live::LiveTable;
use crate::store::{validate_key, RemoteStore};

/// Typed repository over one keyed collection.
pub struct Repository<T: Entity> {
    store: Arc<dyn RemoteStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &T::COLLECTION)
            .finish()
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Repository {
            store,
            _entity: PhantomData,
        }
    }

    fn record_path(key: &str) -> ClientResult<String> {
        validate_key(key)?;
        Ok(T::COLLECTION.record_path(key))
    }

    fn checked(entity: &T) -> ClientResult<Value> {
        let entity = entity.clone().normalized();
        if let Err(e) = entity.validate() {
            debug!(collection = %T::COLLECTION, error = %e, "Rejected invalid document");
            return Err(e.into());
        }
        Ok(serde_json::to_value(&entity)?)
    }

    /// Validates and appends a new document. Returns its generated key.
    pub async fn create(&self, entity: &T) -> ClientResult<String> {
        let doc = Self::checked(entity)?;
        let key = self.store.append(T::COLLECTION.path(), doc).await?;
        debug!(collection = %T::COLLECTION, %key, "Created document");
        Ok(key)
    }

    /// Validates and overwrites the document at `key`.
    pub async fn replace(&self, key: &str, entity: &T) -> ClientResult<()> {
        let path = Self::record_path(key)?;
        let doc = Self::checked(entity)?;
        self.store.set(&path, doc).await?;
        debug!(collection = %T::COLLECTION, %key, "Replaced document");
        Ok(())
    }

    /// Merges `partial` into the document at `key`.
    ///
    /// The merged result must still be a valid document; otherwise nothing
    /// is written. Fields absent from `partial` are left as stored. Every
    /// field name must be a single key; nested paths are rejected.
    pub async fn update_fields(&self, key: &str, partial: Record) -> ClientResult<()> {
        let path = Self::record_path(key)?;
        for field in partial.keys() {
            validate_key(field)?;
        }

        let mut merged = match self.store.get(&path).await? {
            Some(Value::Object(current)) => current,
            _ => Record::new(),
        };
        for (field, value) in &partial {
            merged.insert(field.clone(), value.clone());
        }

        let entity: T = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            ClientError::Decode {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        Self::checked(&entity)?;

        self.store.update(&path, Value::Object(partial)).await?;
        debug!(collection = %T::COLLECTION, %key, "Updated document");
        Ok(())
    }

    /// Deletes the document at `key`. References to it elsewhere are left
    /// dangling.
    pub async fn remove(&self, key: &str) -> ClientResult<()> {
        let path = Self::record_path(key)?;
        self.store.remove(&path).await?;
        debug!(collection = %T::COLLECTION, %key, "Removed document");
        Ok(())
    }

    /// Reads and decodes one document.
    pub async fn get(&self, key: &str) -> ClientResult<Option<T>> {
        let path = Self::record_path(key)?;
        match self.store.get(&path).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                warn!(%path, error = %e, "Stored document does not decode");
                ClientError::Decode {
                    path,
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// One-shot read of the whole collection as rows.
    pub async fn rows(&self) -> ClientResult<Vec<Row>> {
        let value = self.store.get(T::COLLECTION.path()).await?;
        Ok(project_value(value.as_ref()))
    }

    /// Live table of the collection, sorted and filtered per the entity's
    /// table spec.
    pub async fn watch(&self) -> ClientResult<LiveTable> {
        let subscription = self.store.subscribe(T::COLLECTION.path()).await?;
        Ok(LiveTable::new(subscription, T::table_spec()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
