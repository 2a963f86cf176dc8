//! Lodestone Storage Layer
//!
//! Implements the EntryStore trait on top of SQLite.
//!
//! # Architecture
//!
//! - One `identities` table keyed by the undashed identity id
//! - Names compare with `COLLATE NOCASE`, so lookups are case-insensitive
//! - Writes are upserts; the store never deletes
//!
//! # Examples
//!
//! ```no_run
//! use lodestone_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for identity lookups
//! ```

#![warn(missing_docs)]

use lodestone_domain::traits::EntryStore;
use lodestone_domain::{Identity, IdentityId, PlayerName};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored row no longer parses into a domain value
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of EntryStore
///
/// # Thread Safety
///
/// SQLite connections are not `Sync`. Share a store between tasks by wrapping
/// it in a `Mutex`, as the resolvers do.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lodestone_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("lodestone.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of stored identities
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_identity(id: String, name: String) -> Result<Identity, StoreError> {
        let id = IdentityId::parse(&id).map_err(StoreError::InvalidData)?;
        let name = PlayerName::new(name).map_err(StoreError::InvalidData)?;
        Ok(Identity::new(id, name))
    }
}

impl EntryStore for SqliteStore {
    type Error = StoreError;

    fn find_by_name(&self, name: &PlayerName) -> Result<Option<Identity>, Self::Error> {
        // A name can move between ids over time; the latest write wins.
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM identities WHERE name = ?1
                 ORDER BY updated_at DESC, rowid DESC LIMIT 1",
                params![name.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, name)| Self::row_to_identity(id, name))
            .transpose()
    }

    fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM identities WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, name)| Self::row_to_identity(id, name))
            .transpose()
    }

    fn insert(&mut self, identity: Identity) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO identities (id, name, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))
             ON CONFLICT(id) DO UPDATE SET
             name = excluded.name, updated_at = excluded.updated_at",
            params![identity.id.as_str(), identity.name.as_str()],
        )?;

        Ok(())
    }
}
