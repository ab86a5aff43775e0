// crates/capmesh-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Store
// Description: RegistryStore, NamespaceStore, and ForwardStore over SQLite.
// Purpose: Durable JSON-document persistence with WAL and busy timeouts.
// Dependencies: capmesh-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! [`SqliteStore`] opens (or creates) a single database file, applies WAL
//! mode and a busy timeout, and creates the schema when absent. The schema
//! version is tracked in a metadata table; opening a database written by a
//! newer schema fails closed. All three store traits share one connection
//! behind a mutex — store traffic is low-volume (registrations and namespace
//! bindings, not dispatch traffic), so a single guard is sufficient.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use capmesh_core::ForwardReference;
use capmesh_core::ForwardStore;
use capmesh_core::NamespaceSlot;
use capmesh_core::NamespaceStore;
use capmesh_core::RegistryStore;
use capmesh_core::ServiceId;
use capmesh_core::ServiceTarget;
use capmesh_core::StoreError;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Serialize;
use serde::de::DeserializeOwned;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version written into the metadata table.
const SCHEMA_VERSION: i64 = 1;
/// Busy timeout applied to the connection.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

// ============================================================================
// SECTION: Sqlite Store
// ============================================================================

/// SQLite-backed implementation of all Capmesh store contracts.
///
/// # Invariants
/// - The schema version on disk never exceeds [`SCHEMA_VERSION`].
/// - Payload columns hold valid JSON for their record type.
pub struct SqliteStore {
    /// Shared connection; store traffic is low-volume.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be
    /// opened or migrated, and [`StoreError::Corrupt`] when the on-disk
    /// schema is newer than this build understands.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Self::initialize(conn)
    }

    /// Opens an in-memory database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be
    /// created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Self::initialize(conn)
    }

    /// Applies pragmas, creates the schema, and checks the version.
    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                 key TEXT PRIMARY KEY,
                 value INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS targets (
                 id TEXT PRIMARY KEY,
                 payload TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS namespaces (
                 path TEXT PRIMARY KEY,
                 payload TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS forwards (
                 name TEXT PRIMARY KEY,
                 payload TEXT NOT NULL
             );",
        )
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let existing: Option<i64> = conn
            .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        match existing {
            Some(version) if version > SCHEMA_VERSION => {
                return Err(StoreError::Corrupt(format!(
                    "database schema version {version} is newer than supported {SCHEMA_VERSION}"
                )));
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION],
                )
                .map_err(|err| StoreError::Unavailable(err.to_string()))?;
            }
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Upserts one JSON record into a keyed table.
    fn put<T: Serialize>(&self, sql: &str, key: &str, record: &T) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(record).map_err(|err| StoreError::Io(err.to_string()))?;
        let conn = self.lock_conn();
        conn.execute(sql, params![key, payload])
            .map(|_| ())
            .map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Deletes one record by key.
    fn delete(&self, sql: &str, key: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn();
        conn.execute(sql, params![key])
            .map(|_| ())
            .map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Loads every payload from a table, failing closed on bad rows.
    fn load<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>, StoreError> {
        let conn = self.lock_conn();
        let mut statement = conn.prepare(sql).map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let payload = row.map_err(|err| StoreError::Io(err.to_string()))?;
            let record = serde_json::from_str(&payload)
                .map_err(|err| StoreError::Corrupt(err.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Acquires the connection guard, recovering from poisoning.
    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ============================================================================
// SECTION: Trait Implementations
// ============================================================================

impl RegistryStore for SqliteStore {
    fn save(&self, target: &ServiceTarget) -> Result<(), StoreError> {
        let Some(id) = &target.id else {
            return Err(StoreError::Io("target has no issued id".to_string()));
        };
        self.put(
            "INSERT INTO targets (id, payload) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET payload = excluded.payload",
            id.as_str(),
            target,
        )
    }

    fn remove(&self, id: &ServiceId) -> Result<(), StoreError> {
        self.delete("DELETE FROM targets WHERE id = ?1", id.as_str())
    }

    fn load_all(&self) -> Result<Vec<ServiceTarget>, StoreError> {
        self.load("SELECT payload FROM targets ORDER BY id")
    }
}

impl NamespaceStore for SqliteStore {
    fn save(&self, slot: &NamespaceSlot) -> Result<(), StoreError> {
        self.put(
            "INSERT INTO namespaces (path, payload) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET payload = excluded.payload",
            &slot.path,
            slot,
        )
    }

    fn load_all(&self) -> Result<Vec<NamespaceSlot>, StoreError> {
        self.load("SELECT payload FROM namespaces ORDER BY path")
    }
}

impl ForwardStore for SqliteStore {
    fn save(&self, reference: &ForwardReference) -> Result<(), StoreError> {
        self.put(
            "INSERT INTO forwards (name, payload) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET payload = excluded.payload",
            &reference.name,
            reference,
        )
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.delete("DELETE FROM forwards WHERE name = ?1", name)
    }

    fn load_all(&self) -> Result<Vec<ForwardReference>, StoreError> {
        self.load("SELECT payload FROM forwards ORDER BY name")
    }
}
