//! Record store used by the simulation.
//!
//! The store is a set of named collections of JSON documents keyed by `u64`
//! id. [`RecordStore`] is the seam a persistent backend plugs into;
//! [`MemoryStore`] backs the server and the tests. [`TableExt`] adds typed
//! access on top of any store.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

use crate::error::StoreError;
use crate::tables::Record;

/// Document store keyed by collection name and id.
pub trait RecordStore: Send + Sync {
    /// Insert a new document and return the id assigned to it.
    fn insert(&self, collection: &str, doc: Value) -> Result<u64, StoreError>;

    fn get(&self, collection: &str, id: u64) -> Result<Option<Value>, StoreError>;

    /// Create or replace the document at `id`.
    fn put(&self, collection: &str, id: u64, doc: Value) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    fn delete(&self, collection: &str, id: u64) -> Result<bool, StoreError>;

    /// Every document in the collection, ordered by id.
    fn scan(&self, collection: &str) -> Result<Vec<(u64, Value)>, StoreError>;
}

fn decode<R: Record>(doc: Value) -> Result<R, StoreError> {
    serde_json::from_value(doc).map_err(|source| StoreError::Serialization {
        collection: R::COLLECTION.to_string(),
        source,
    })
}

fn encode<R: Record>(record: &R) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|source| StoreError::Serialization {
        collection: R::COLLECTION.to_string(),
        source,
    })
}

/// Typed access to a [`RecordStore`].
pub trait TableExt: RecordStore {
    /// Insert `record`, returning it with its assigned id.
    fn create<R: Record>(&self, mut record: R) -> Result<R, StoreError> {
        let id = self.insert(R::COLLECTION, encode(&record)?)?;
        record.set_id(id);
        Ok(record)
    }

    fn find<R: Record>(&self, id: u64) -> Result<Option<R>, StoreError> {
        self.get(R::COLLECTION, id)?.map(decode::<R>).transpose()
    }

    /// Like [`TableExt::find`] but a missing record is an error.
    fn fetch<R: Record>(&self, id: u64) -> Result<R, StoreError> {
        self.find(id)?.ok_or(StoreError::NotFound {
            collection: R::COLLECTION,
            id,
        })
    }

    fn save<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.put(R::COLLECTION, record.id(), encode(record)?)
    }

    fn remove<R: Record>(&self, id: u64) -> Result<bool, StoreError> {
        self.delete(R::COLLECTION, id)
    }

    fn all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.scan(R::COLLECTION)?
            .into_iter()
            .map(|(_, doc)| decode::<R>(doc))
            .collect()
    }

    fn filter<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> Result<Vec<R>, StoreError> {
        Ok(self.all::<R>()?.into_iter().filter(|r| predicate(r)).collect())
    }
}

impl<S: RecordStore + ?Sized> TableExt for S {}

#[derive(Default)]
struct Collection {
    last_id: u64,
    docs: BTreeMap<u64, Value>,
}

/// In-process store. Ids start at 1 per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable {
        detail: "memory store lock poisoned".to_string(),
    }
}

fn with_id(mut doc: Value, id: u64) -> Value {
    if let Value::Object(map) = &mut doc {
        map.insert("id".to_string(), Value::from(id));
    }
    doc
}

impl RecordStore for MemoryStore {
    fn insert(&self, collection: &str, doc: Value) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let c = collections.entry(collection.to_string()).or_default();
        c.last_id += 1;
        let id = c.last_id;
        c.docs.insert(id, with_id(doc, id));
        Ok(id)
    }

    fn get(&self, collection: &str, id: u64) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.get(&id))
            .cloned())
    }

    fn put(&self, collection: &str, id: u64, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let c = collections.entry(collection.to_string()).or_default();
        c.last_id = c.last_id.max(id);
        c.docs.insert(id, with_id(doc, id));
        Ok(())
    }

    fn delete(&self, collection: &str, id: u64) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        Ok(collections
            .get_mut(collection)
            .is_some_and(|c| c.docs.remove(&id).is_some()))
    }

    fn scan(&self, collection: &str) -> Result<Vec<(u64, Value)>, StoreError> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .map(|c| c.docs.iter().map(|(id, doc)| (*id, doc.clone())).collect())
            .unwrap_or_default())
    }
}
