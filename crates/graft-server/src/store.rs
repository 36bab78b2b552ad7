// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use graft_api::ApiError;
use graft_core::TypeName;
use graft_model::{GlobalId, Patch, Record, SortOrder};
use graft_query::{
    keyed_records, scan_sorted, FetchQuery, OrderedSource, SourceError, SourceRow,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    Conflict(String),
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Conflict(msg) | Self::Backend(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ApiError::not_found(&what),
            StoreError::Conflict(msg) => ApiError::new(
                graft_core::ErrorCode::InvalidArguments,
                msg,
                serde_json::json!({"reason": "conflict"}),
            ),
            StoreError::Backend(msg) => ApiError::internal(msg),
        }
    }
}

/// Storage collaborator. Writes receive only validated patches.
pub trait DataStore: Send + Sync {
    fn get(&self, id: &GlobalId) -> Result<Option<Record>, StoreError>;

    /// Applies `patch` to an existing record and returns the stored result.
    fn put(&self, id: &GlobalId, patch: &Patch) -> Result<Record, StoreError>;

    /// Stores a new record. An empty local id asks the store to assign one.
    fn insert(&self, record: Record) -> Result<Record, StoreError>;

    fn fetch_ordered(&self, query: &FetchQuery) -> Result<Vec<SourceRow<Record>>, StoreError>;

    fn count(&self, type_name: &TypeName) -> Result<u64, StoreError>;
}

type RecordKey = (TypeName, String);

/// Process-local store behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<RecordKey, Record>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("memory store lock poisoned".to_string())
    }
}

impl DataStore for MemoryStore {
    fn get(&self, id: &GlobalId) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records
            .get(&(id.type_name().clone(), id.local_id().to_string()))
            .cloned())
    }

    fn put(&self, id: &GlobalId, patch: &Patch) -> Result<Record, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let record = records
            .get_mut(&(id.type_name().clone(), id.local_id().to_string()))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record
            .apply(patch)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;
        Ok(record.clone())
    }

    fn insert(&self, mut record: Record) -> Result<Record, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        if record.local_id.is_empty() {
            loop {
                let candidate = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
                if !records.contains_key(&(record.type_name.clone(), candidate.clone())) {
                    record.local_id = candidate;
                    break;
                }
            }
        }
        let key = (record.type_name.clone(), record.local_id.clone());
        if records.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "{}:{} already exists",
                key.0, key.1
            )));
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    fn fetch_ordered(&self, query: &FetchQuery) -> Result<Vec<SourceRow<Record>>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let rows = keyed_records(
            records
                .range((query.order.source.clone(), String::new())..)
                .take_while(|((t, _), _)| *t == query.order.source)
                .map(|(_, r)| r),
            &query.order,
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(scan_sorted(&rows, query))
    }

    fn count(&self, type_name: &TypeName) -> Result<u64, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let n = records.keys().filter(|(t, _)| t == type_name).count();
        Ok(n as u64)
    }
}

/// Exposes a [`DataStore`] as the ordered source of a connection.
pub struct StoreSource<'a>(pub &'a dyn DataStore);

impl OrderedSource for StoreSource<'_> {
    type Node = Record;

    fn fetch_ordered(&self, query: &FetchQuery) -> Result<Vec<SourceRow<Record>>, SourceError> {
        self.0
            .fetch_ordered(query)
            .map_err(|e| SourceError::new(e.to_string()))
    }

    fn total_count(&self, order: &SortOrder) -> Result<Option<u64>, SourceError> {
        self.0
            .count(&order.source)
            .map(Some)
            .map_err(|e| SourceError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_model::{merge_update, EntitySchema, FieldKind, FieldSpec, UpdateInput};
    use graft_core::FieldName;
    use serde_json::{json, Map};

    fn user() -> TypeName {
        TypeName::new("User").expect("type")
    }

    #[test]
    fn insert_assigns_ids_and_rejects_conflicts() {
        let store = MemoryStore::new();
        let a = store.insert(Record::new(user(), "", Map::new())).expect("a");
        let b = store.insert(Record::new(user(), "", Map::new())).expect("b");
        assert_ne!(a.local_id, b.local_id);
        let err = store
            .insert(Record::new(user(), a.local_id.clone(), Map::new()))
            .expect_err("conflict");
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count(&user()).expect("count"), 2);
    }

    #[test]
    fn put_applies_patch_and_reports_missing_rows() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Record::new(
                user(),
                "7",
                json!({"name": "a"}).as_object().cloned().expect("object"),
            ))
            .expect("insert");
        let schema = EntitySchema::new(
            user(),
            vec![FieldSpec::required(FieldName::new("name").expect("f"), FieldKind::String)],
        )
        .expect("schema");
        let patch =
            merge_update(&schema, &UpdateInput::new().set("name", json!("b"))).expect("patch");
        let id = stored.global_id().expect("id");
        let updated = store.put(&id, &patch).expect("put");
        assert_eq!(updated.field("name"), Some(&json!("b")));

        let missing = GlobalId::new(user(), "404").expect("id");
        assert!(matches!(
            store.put(&missing, &patch),
            Err(StoreError::NotFound(_))
        ));
    }
}
