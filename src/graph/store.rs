//! SQLite-backed knowledge graph
//!
//! Nodes and edges live in two tables with JSON-encoded properties. Edges
//! carry no foreign keys: a mutation batch may link to a node
//! that a later batch creates, and the store accepts that.
//!
//! All access goes through one connection behind a mutex, so every write is
//! its own critical section. Outside this crate the only write path is
//! [`GraphStore::apply_mutation`].

use crate::core::error::{BrainError, Result};
use crate::graph::mutation::{EdgeDraft, GraphMutation, MutationSpec, NodeDraft, NodePatch};
use crate::graph::types::{Edge, Node, Properties};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const NODE_COLUMNS: &str = "id, type, label, properties, created_at, updated_at";
const EDGE_COLUMNS: &str = "id, type, from_id, to_id, properties, created_at, updated_at";

/// Durable typed property graph
pub struct GraphStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    conn: Connection,
    /// Last timestamp handed out; stamps are strictly increasing
    last_stamp: Option<DateTime<Utc>>,
}

impl StoreInner {
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl GraphStore {
    /// Open (or create) the database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory graph (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                label TEXT,
                properties TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                from_id TEXT NOT NULL,
                to_id TEXT NOT NULL,
                properties TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type);
            CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_id);
            CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id);
            "#,
        )?;

        Ok(Self {
            inner: Mutex::new(StoreInner {
                conn,
                last_stamp: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply one wire mutation, returning the id of the affected node or edge
    pub fn apply_mutation(&self, spec: &MutationSpec) -> Result<String> {
        let mutation = GraphMutation::from_spec(spec)?;
        self.apply(mutation)
    }

    fn apply(&self, mutation: GraphMutation) -> Result<String> {
        match mutation {
            GraphMutation::CreateNode(NodeDraft {
                id,
                node_type,
                label,
                properties,
            }) => self.create_node(&node_type, label.as_deref(), properties, id.as_deref()),
            GraphMutation::UpdateNode(NodePatch {
                id,
                label,
                properties,
                merge,
            }) => {
                self.update_node(&id, label.as_deref(), properties, merge)?;
                Ok(id)
            }
            GraphMutation::CreateEdge(EdgeDraft {
                id,
                edge_type,
                from_id,
                to_id,
                properties,
            }) => self.create_edge(&edge_type, &from_id, &to_id, properties, id.as_deref()),
        }
    }

    pub(crate) fn create_node(
        &self,
        node_type: &str,
        label: Option<&str>,
        properties: Option<Properties>,
        id: Option<&str>,
    ) -> Result<String> {
        if node_type.trim().is_empty() {
            return Err(BrainError::Validation("node type must not be empty".into()));
        }
        let id = resolve_id(id);
        let properties_json = serde_json::to_string(&properties.unwrap_or_default())?;

        let mut inner = self.lock();
        let stamp = format_stamp(inner.next_stamp());
        inner
            .conn
            .execute(
                "INSERT INTO nodes (id, type, label, properties, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id, node_type, label, properties_json, stamp],
            )
            .map_err(|e| duplicate_id_error(e, "node", &id))?;

        Ok(id)
    }

    /// Update label and/or properties of an existing node
    ///
    /// With `merge` the new properties are shallow-merged over the existing
    /// ones; without it they replace them. `None` properties leave the stored
    /// ones untouched either way.
    pub(crate) fn update_node(
        &self,
        id: &str,
        label: Option<&str>,
        properties: Option<Properties>,
        merge: bool,
    ) -> Result<()> {
        if id.is_empty() {
            return Err(BrainError::Validation("update_node requires an id".into()));
        }

        let mut inner = self.lock();
        let stamp = format_stamp(inner.next_stamp());
        let tx = inner.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row("SELECT properties FROM nodes WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let existing = existing.ok_or_else(|| BrainError::NotFound(format!("node {}", id)))?;

        let properties = match properties {
            None => serde_json::from_str::<Properties>(&existing)?,
            Some(update) if merge => {
                let mut current: Properties = serde_json::from_str(&existing)?;
                current.extend(update);
                current
            }
            Some(replacement) => replacement,
        };
        let properties_json = serde_json::to_string(&properties)?;

        match label {
            Some(label) => tx.execute(
                "UPDATE nodes SET label = ?1, properties = ?2, updated_at = ?3 WHERE id = ?4",
                params![label, properties_json, stamp, id],
            )?,
            None => tx.execute(
                "UPDATE nodes SET properties = ?1, updated_at = ?2 WHERE id = ?3",
                params![properties_json, stamp, id],
            )?,
        };
        tx.commit()?;
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let inner = self.lock();
        let node = inner
            .conn
            .query_row(
                &format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS),
                [id],
                node_from_row,
            )
            .optional()?;
        Ok(node)
    }

    /// Create an edge; endpoints are not required to exist
    pub(crate) fn create_edge(
        &self,
        edge_type: &str,
        from_id: &str,
        to_id: &str,
        properties: Option<Properties>,
        id: Option<&str>,
    ) -> Result<String> {
        if edge_type.trim().is_empty() {
            return Err(BrainError::Validation("edge type must not be empty".into()));
        }
        if from_id.is_empty() || to_id.is_empty() {
            return Err(BrainError::Validation(
                "edge requires from_id and to_id".into(),
            ));
        }
        let id = resolve_id(id);
        let properties_json = serde_json::to_string(&properties.unwrap_or_default())?;

        let mut inner = self.lock();
        let stamp = format_stamp(inner.next_stamp());
        inner
            .conn
            .execute(
                "INSERT INTO edges (id, type, from_id, to_id, properties, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![id, edge_type, from_id, to_id, properties_json, stamp],
            )
            .map_err(|e| duplicate_id_error(e, "edge", &id))?;

        Ok(id)
    }

    pub fn get_edge(&self, id: &str) -> Result<Option<Edge>> {
        let inner = self.lock();
        let edge = inner
            .conn
            .query_row(
                &format!("SELECT {} FROM edges WHERE id = ?1", EDGE_COLUMNS),
                [id],
                edge_from_row,
            )
            .optional()?;
        Ok(edge)
    }

    /// Nodes of one type, most recently updated first
    pub fn find_nodes_by_type(&self, node_type: &str, limit: usize) -> Result<Vec<Node>> {
        let inner = self.lock();
        let mut stmt = inner.conn.prepare(&format!(
            "SELECT {} FROM nodes WHERE type = ?1 ORDER BY updated_at DESC LIMIT ?2",
            NODE_COLUMNS
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let nodes = stmt
            .query_map(params![node_type, limit], node_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    pub fn node_count(&self) -> Result<usize> {
        let inner = self.lock();
        let count: i64 = inner
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn resolve_id(id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

fn format_stamp(stamp: DateTime<Utc>) -> String {
    stamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn duplicate_id_error(err: rusqlite::Error, what: &str, id: &str) -> BrainError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            BrainError::Validation(format!("{} id '{}' already exists", what, id))
        }
        _ => BrainError::Storage(err),
    }
}

fn parse_stamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_properties(row: &Row<'_>, idx: usize) -> rusqlite::Result<Properties> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get(0)?,
        node_type: row.get(1)?,
        label: row.get(2)?,
        properties: parse_properties(row, 3)?,
        created_at: parse_stamp(row, 4)?,
        updated_at: parse_stamp(row, 5)?,
    })
}

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<Edge> {
    Ok(Edge {
        id: row.get(0)?,
        edge_type: row.get(1)?,
        from_id: row.get(2)?,
        to_id: row.get(3)?,
        properties: parse_properties(row, 4)?,
        created_at: parse_stamp(row, 5)?,
        updated_at: parse_stamp(row, 6)?,
    })
}
