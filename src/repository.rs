//! Item Repository
//!
//! Idempotent creates and latest-version reads on top of a `StoreClient`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{Config, ReadStrategy, UniquenessKey};
use crate::error::{ItemError, Result};
use crate::item::{partition_key, Clock, Item, SystemClock, LEGACY_SORT_KEY};
use crate::store::{PutCondition, SortOrder, StorageKey, StoreClient};

/// Result status of a create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStatus {
    Created,
    AlreadyExists,
}

/// Outcome of `create_item`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub id: String,
    pub status: CreateStatus,
}

/// Outcome of `get_item`
#[derive(Debug, Clone, PartialEq)]
pub enum GetOutcome {
    /// The payload of the newest row for the id
    Found(Value),

    NotFound,

    /// No id was supplied; the store was not contacted
    IdRequired,
}

impl GetOutcome {
    /// Body returned to the caller. Misses are error-shaped but not errors.
    pub fn into_body(self) -> Value {
        match self {
            GetOutcome::Found(payload) => payload,
            GetOutcome::NotFound => json!({ "error": "item not found" }),
            GetOutcome::IdRequired => json!({ "error": "id required" }),
        }
    }
}

/// Reads and writes items through a shared store handle
pub struct ItemRepository {
    store: Arc<dyn StoreClient>,
    clock: Arc<dyn Clock>,
    uniqueness_key: UniquenessKey,
    read_strategy: ReadStrategy,
}

impl ItemRepository {
    pub fn new(store: Arc<dyn StoreClient>, config: &Config) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn StoreClient>, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            uniqueness_key: config.uniqueness_key,
            read_strategy: config.read_strategy,
        }
    }

    /// Write `payload` once per id.
    ///
    /// The id is the idempotency key when one is given and non-empty,
    /// otherwise a fresh v4 UUID. A rejected duplicate is reported as
    /// `AlreadyExists`, not as an error.
    pub fn create_item(&self, payload: Value, idempotency_key: Option<&str>) -> Result<CreateOutcome> {
        let id = match idempotency_key {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        let record = Item::new(id.clone(), payload, self.clock.now()).into_record();
        let condition = match self.uniqueness_key {
            UniquenessKey::LogicalId => PutCondition::PartitionNotExists,
            UniquenessKey::CompositeKey => PutCondition::KeyNotExists,
        };

        match self.store.put_conditional(record, condition) {
            Ok(()) => {
                tracing::debug!(id = %id, "created item");
                Ok(CreateOutcome { id, status: CreateStatus::Created })
            }
            Err(ItemError::ConditionalCheckFailed { .. }) => {
                tracing::debug!(id = %id, "item already exists");
                Ok(CreateOutcome { id, status: CreateStatus::AlreadyExists })
            }
            Err(e) => Err(e),
        }
    }

    /// Payload of the current row for `id`
    pub fn get_item(&self, id: Option<&str>) -> Result<GetOutcome> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(GetOutcome::IdRequired),
        };

        let pk = partition_key(id);
        let record = match self.read_strategy {
            ReadStrategy::LatestVersion => self
                .store
                .query_by_partition(&pk, SortOrder::Descending, 1)?
                .into_iter()
                .next(),
            ReadStrategy::PointLookup => self.store.get_by_key(&StorageKey::new(pk, LEGACY_SORT_KEY))?,
        };

        Ok(match record {
            Some(record) => GetOutcome::Found(record.data),
            None => GetOutcome::NotFound,
        })
    }
}
