use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};

use crate::schema::{self, Namespace};
use crate::store::{Entity, EntityId, StoreError, TxOp};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS entities (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    namespace TEXT NOT NULL,
                    attrs TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS links (
                    link TEXT NOT NULL,
                    source_id TEXT NOT NULL,
                    target_id TEXT NOT NULL,
                    PRIMARY KEY (link, source_id)
                );

                CREATE INDEX IF NOT EXISTS idx_entities_namespace ON entities(namespace);
                CREATE INDEX IF NOT EXISTS idx_links_target ON links(link, target_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Reads ---

    /// All entities of `namespace` in insertion order, with forward links and
    /// reverse links attached.
    pub fn entities(&self, namespace: Namespace) -> Result<Vec<Entity>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, attrs FROM entities WHERE namespace = ?1 ORDER BY seq")?;
        let rows = stmt
            .query_map(params![namespace.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entities = Vec::with_capacity(rows.len());
        for (id, attrs) in rows {
            entities.push(Entity {
                id: id.parse()?,
                namespace,
                attrs: serde_json::from_str(&attrs)?,
                links: BTreeMap::new(),
            });
        }

        for def in schema::links_from(namespace) {
            let pairs = self.link_pairs(def.name)?;
            let targets: HashMap<EntityId, EntityId> = pairs.into_iter().collect();
            for entity in &mut entities {
                if let Some(target) = targets.get(&entity.id) {
                    entity.links.insert(def.label.to_string(), vec![*target]);
                }
            }
        }

        for def in schema::links_to(namespace) {
            let mut sources: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
            for (source, target) in self.link_pairs(def.name)? {
                sources.entry(target).or_default().push(source);
            }
            for entity in &mut entities {
                if let Some(ids) = sources.remove(&entity.id) {
                    entity.links.insert(def.reverse_label.to_string(), ids);
                }
            }
        }

        Ok(entities)
    }

    /// `(source, target)` pairs of one link, oldest first.
    fn link_pairs(&self, link: &str) -> Result<Vec<(EntityId, EntityId)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_id, target_id FROM links WHERE link = ?1 ORDER BY rowid")?;
        let pairs = stmt
            .query_map(params![link], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        pairs
            .into_iter()
            .map(|(s, t)| -> Result<(EntityId, EntityId), StoreError> {
                Ok((s.parse()?, t.parse()?))
            })
            .collect()
    }

    // --- Writes ---

    /// Apply a batch of operations in a single SQLite transaction.
    pub fn apply(&self, ops: &[TxOp]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        for op in ops {
            match op {
                TxOp::Update {
                    namespace,
                    id,
                    attrs,
                } => {
                    schema::validate_attrs(*namespace, attrs)?;
                    upsert_entity(&tx, *namespace, *id, attrs, &now)?;
                }
                TxOp::Link {
                    namespace,
                    id,
                    label,
                    target,
                } => {
                    let def = schema::find_link(*namespace, label).ok_or_else(|| {
                        StoreError::UnknownLink {
                            namespace: *namespace,
                            label: label.clone(),
                        }
                    })?;
                    require_entity(&tx, *namespace, *id)?;
                    require_entity(&tx, def.target, *target)?;
                    tx.execute(
                        "INSERT INTO links (link, source_id, target_id) VALUES (?1, ?2, ?3)
                         ON CONFLICT(link, source_id) DO UPDATE SET target_id = excluded.target_id",
                        params![def.name, id.to_string(), target.to_string()],
                    )?;
                }
                TxOp::Delete { namespace, id } => {
                    delete_entity(&tx, *namespace, *id)?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

fn entity_namespace(conn: &Connection, id: EntityId) -> Result<Option<Namespace>, StoreError> {
    let ns: Option<String> = conn
        .query_row(
            "SELECT namespace FROM entities WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    ns.map(|s| s.parse()).transpose()
}

fn check_namespace(id: EntityId, expected: Namespace, actual: Namespace) -> Result<(), StoreError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StoreError::NamespaceMismatch {
            id,
            expected,
            actual,
        })
    }
}

fn require_entity(conn: &Connection, namespace: Namespace, id: EntityId) -> Result<(), StoreError> {
    match entity_namespace(conn, id)? {
        Some(actual) => check_namespace(id, namespace, actual),
        None => Err(StoreError::NotFound { namespace, id }),
    }
}

fn upsert_entity(
    conn: &Connection,
    namespace: Namespace,
    id: EntityId,
    attrs: &Map<String, Value>,
    now: &str,
) -> Result<(), StoreError> {
    let existing: Option<(String, String)> = conn
        .query_row(
            "SELECT namespace, attrs FROM entities WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match existing {
        Some((ns, stored)) => {
            check_namespace(id, namespace, ns.parse()?)?;
            let mut merged: Map<String, Value> = serde_json::from_str(&stored)?;
            for (key, value) in attrs {
                if value.is_null() {
                    merged.remove(key);
                } else {
                    merged.insert(key.clone(), value.clone());
                }
            }
            conn.execute(
                "UPDATE entities SET attrs = ?1, updated_at = ?2 WHERE id = ?3",
                params![serde_json::to_string(&merged)?, now, id.to_string()],
            )?;
        }
        None => {
            let fresh: Map<String, Value> = attrs
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            conn.execute(
                "INSERT INTO entities (id, namespace, attrs, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    namespace.as_str(),
                    serde_json::to_string(&fresh)?,
                    now,
                    now
                ],
            )?;
        }
    }
    Ok(())
}

fn delete_entity(conn: &Connection, namespace: Namespace, id: EntityId) -> Result<(), StoreError> {
    let Some(actual) = entity_namespace(conn, id)? else {
        return Ok(());
    };
    check_namespace(id, namespace, actual)?;

    for def in schema::cascading_links_to(namespace) {
        let dependents: Vec<String> = {
            let mut stmt =
                conn.prepare("SELECT source_id FROM links WHERE link = ?1 AND target_id = ?2")?;
            stmt.query_map(params![def.name, id.to_string()], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?
        };
        for dependent in dependents {
            delete_entity(conn, def.on, dependent.parse()?)?;
        }
    }

    conn.execute(
        "DELETE FROM links WHERE source_id = ?1 OR target_id = ?1",
        params![id.to_string()],
    )?;
    conn.execute(
        "DELETE FROM entities WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}
