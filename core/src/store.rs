//! The entity store the dashboard reads from and writes to.
//!
//! Callers describe reads as a list of namespaces and writes as batches of
//! [`TxOp`]s. Each batch passed to [`Store::transact`] is applied atomically;
//! separate batches succeed or fail independently, so callers that want
//! best-effort semantics issue one batch per unit of work.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::Database;
use crate::schema::Namespace;

/// Client-generated opaque identifier, valid before the entity is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| StoreError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown namespace '{0}'")]
    UnknownNamespace(String),
    #[error("invalid entity id '{0}'")]
    InvalidId(String),
    #[error("{namespace} has no attribute '{attribute}'")]
    UnknownAttribute {
        namespace: Namespace,
        attribute: String,
    },
    #[error("invalid value for {namespace}.{attribute}: {reason}")]
    Validation {
        namespace: Namespace,
        attribute: String,
        reason: String,
    },
    #[error("{namespace} has no link labelled '{label}'")]
    UnknownLink { namespace: Namespace, label: String },
    #[error("{namespace} entity {id} not found")]
    NotFound { namespace: Namespace, id: EntityId },
    #[error("entity {id} belongs to {actual}, not {expected}")]
    NamespaceMismatch {
        id: EntityId,
        expected: Namespace,
        actual: Namespace,
    },
    #[error("{namespace} entity {id} has an unexpected shape: {source}")]
    Decode {
        namespace: Namespace,
        id: EntityId,
        source: serde_json::Error,
    },
    #[error("entity attributes must serialize to a JSON object")]
    NotAnObject,
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One stored entity: its attributes plus linked ids, keyed by forward label
/// (`habit`) or reverse label (`completions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub namespace: Namespace,
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, Vec<EntityId>>,
}

impl Entity {
    /// Decode into a typed record. The entity id is exposed to the record as `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut attrs = self.attrs.clone();
        attrs.insert("id".to_string(), Value::String(self.id.to_string()));
        serde_json::from_value(Value::Object(attrs)).map_err(|source| StoreError::Decode {
            namespace: self.namespace,
            id: self.id,
            source,
        })
    }

    #[must_use]
    pub fn linked(&self, label: &str) -> &[EntityId] {
        self.links.get(label).map_or(&[], Vec::as_slice)
    }
}

/// Entity sets returned by [`Store::query`], keyed by namespace.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    sets: HashMap<Namespace, Vec<Entity>>,
}

impl QueryResult {
    #[must_use]
    pub fn new(sets: HashMap<Namespace, Vec<Entity>>) -> Self {
        Self { sets }
    }

    /// Entities of `namespace`; an unrequested namespace reads as empty.
    #[must_use]
    pub fn entities(&self, namespace: Namespace) -> &[Entity] {
        self.sets.get(&namespace).map_or(&[], Vec::as_slice)
    }

    pub fn decode_all<T: DeserializeOwned>(&self, namespace: Namespace) -> Result<Vec<T>, StoreError> {
        self.entities(namespace).iter().map(Entity::decode).collect()
    }
}

/// A single mutation inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TxOp {
    /// Create the entity, or merge `attrs` into it. `null` clears an attribute.
    Update {
        namespace: Namespace,
        id: EntityId,
        attrs: Map<String, Value>,
    },
    /// Point the has-one link `label` of `id` at `target`, replacing any previous target.
    Link {
        namespace: Namespace,
        id: EntityId,
        label: String,
        target: EntityId,
    },
    /// Remove the entity, its links, and cascading dependents. Missing ids are ignored.
    Delete { namespace: Namespace, id: EntityId },
}

impl TxOp {
    pub fn update<T: Serialize>(
        namespace: Namespace,
        id: EntityId,
        value: &T,
    ) -> Result<Self, StoreError> {
        match serde_json::to_value(value)? {
            Value::Object(attrs) => Ok(TxOp::Update {
                namespace,
                id,
                attrs,
            }),
            _ => Err(StoreError::NotAnObject),
        }
    }

    #[must_use]
    pub fn link(namespace: Namespace, id: EntityId, label: &str, target: EntityId) -> Self {
        TxOp::Link {
            namespace,
            id,
            label: label.to_string(),
            target,
        }
    }

    #[must_use]
    pub fn delete(namespace: Namespace, id: EntityId) -> Self {
        TxOp::Delete { namespace, id }
    }

    #[must_use]
    pub fn namespace(&self) -> Namespace {
        match self {
            TxOp::Update { namespace, .. }
            | TxOp::Link { namespace, .. }
            | TxOp::Delete { namespace, .. } => *namespace,
        }
    }
}

/// Read, write, and id-generation capabilities of the entity database.
#[async_trait]
pub trait Store: Send + Sync {
    /// Return every entity of each requested namespace.
    async fn query(&self, namespaces: &[Namespace]) -> Result<QueryResult, StoreError>;

    /// Apply `ops` as one atomic batch.
    async fn transact(&self, ops: Vec<TxOp>) -> Result<(), StoreError>;

    fn new_id(&self) -> EntityId {
        EntityId::new()
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn query(&self, namespaces: &[Namespace]) -> Result<QueryResult, StoreError> {
        (**self).query(namespaces).await
    }

    async fn transact(&self, ops: Vec<TxOp>) -> Result<(), StoreError> {
        (**self).transact(ops).await
    }

    fn new_id(&self) -> EntityId {
        (**self).new_id()
    }
}

/// [`Store`] backed by a local SQLite file.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn query(&self, namespaces: &[Namespace]) -> Result<QueryResult, StoreError> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sets = HashMap::with_capacity(namespaces.len());
        for &ns in namespaces {
            sets.insert(ns, db.entities(ns)?);
        }
        Ok(QueryResult::new(sets))
    }

    async fn transact(&self, ops: Vec<TxOp>) -> Result<(), StoreError> {
        log::debug!("transact: {} op(s)", ops.len());
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.apply(&ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: EntityId,
        name: String,
    }

    #[test]
    fn test_entity_id_parse() {
        let id = EntityId::new();
        assert_eq!(id.to_string().parse::<EntityId>().unwrap(), id);
        assert!("nope".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_decode_exposes_id() {
        let id = EntityId::new();
        let mut attrs = Map::new();
        attrs.insert("name".to_string(), json!("Read"));
        let entity = Entity {
            id,
            namespace: Namespace::Habits,
            attrs,
            links: BTreeMap::new(),
        };
        let named: Named = entity.decode().unwrap();
        assert_eq!(named.id, id);
        assert_eq!(named.name, "Read");
    }

    #[test]
    fn test_entity_decode_reports_shape_errors() {
        let entity = Entity {
            id: EntityId::new(),
            namespace: Namespace::Habits,
            attrs: Map::new(),
            links: BTreeMap::new(),
        };
        let err = entity.decode::<Named>().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_update_requires_object() {
        let err = TxOp::update(Namespace::Habits, EntityId::new(), &"plain").unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject));
    }

    #[tokio::test]
    async fn test_sqlite_store_write_then_query() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.new_id();
        store
            .transact(vec![
                TxOp::update(Namespace::Habits, id, &json!({ "name": "Stretch" })).unwrap(),
            ])
            .await
            .unwrap();

        let result = store
            .query(&[Namespace::Habits, Namespace::HabitTracks])
            .await
            .unwrap();
        assert_eq!(result.entities(Namespace::Habits).len(), 1);
        assert!(result.entities(Namespace::HabitTracks).is_empty());
        assert!(result.entities(Namespace::Books).is_empty());
        assert_eq!(result.entities(Namespace::Habits)[0].id, id);
    }

    #[tokio::test]
    async fn test_sqlite_store_failed_batch_is_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.new_id();
        let result = store
            .transact(vec![
                TxOp::update(Namespace::Habits, id, &json!({ "name": "Stretch" })).unwrap(),
                TxOp::link(Namespace::Habits, id, "habit", EntityId::new()),
            ])
            .await;
        assert!(result.is_err());

        let after = store.query(&[Namespace::Habits]).await.unwrap();
        assert!(after.entities(Namespace::Habits).is_empty());
    }
}
