//! Database handle with an explicit init-once lifecycle.
//!
//! The pipeline does not read or write the database; the runner opens it at
//! startup through an [`InitGuard`] so repeated initialization is a no-op,
//! and tears it down on exit.

mod guard;

pub use guard::InitGuard;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Database configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file to open. In-memory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// SQLite connection handle.
pub struct Database {
    conn: Mutex<Connection>,
    location: String,
}

impl Database {
    /// Open the database described by `config`.
    pub fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match &config.path {
            Some(path) => Self::new(path),
            None => Self::in_memory(),
        }
    }

    /// Open (creating if needed) a SQLite file.
    pub fn new(path: &Path) -> Result<Self, DatabaseError> {
        info!("Opening connection to {}", path.display());
        let conn = Connection::open(path).map_err(|e| DatabaseError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
        })
    }

    /// Open an in-memory database (useful for testing)
    pub fn in_memory() -> Result<Self, DatabaseError> {
        info!("Opening connection to in-memory database");
        let conn =
            Connection::open_in_memory().map_err(|e| DatabaseError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: ":memory:".to_string(),
        })
    }

    /// Where the connection points.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Check that the connection answers queries.
    pub fn ping(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::Poisoned)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| DatabaseError::Database(e.to_string()))?;
        Ok(())
    }

    /// Close the connection, reporting any error from SQLite.
    pub fn close(self) -> Result<(), DatabaseError> {
        info!("Closing connection to {}", self.location);
        let conn = self.conn.into_inner().map_err(|_| DatabaseError::Poisoned)?;
        conn.close()
            .map_err(|(_, e)| DatabaseError::Database(e.to_string()))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish()
    }
}
