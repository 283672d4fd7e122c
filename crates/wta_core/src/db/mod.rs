//! SQLite bootstrap, schema migrations and destination metadata.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the relay core.
//! - Apply schema migrations in deterministic order.
//! - Read and write destination endpoint metadata.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Report stores must not touch report tables before migrations succeed.

use crate::model::endpoint::{DestinationId, Endpoint};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "report database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Inserts or replaces endpoint metadata for one destination.
pub fn upsert_destination(
    conn: &Connection,
    destination_id: DestinationId,
    endpoint: &Endpoint,
) -> DbResult<()> {
    conn.execute(
        "INSERT INTO destinations (destination_id, address, port)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(destination_id) DO UPDATE SET
            address = excluded.address,
            port = excluded.port,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![destination_id, endpoint.address.as_str(), endpoint.port],
    )?;
    Ok(())
}

/// Loads endpoint metadata for one destination, if registered.
pub fn find_destination(
    conn: &Connection,
    destination_id: DestinationId,
) -> DbResult<Option<Endpoint>> {
    let endpoint = conn
        .query_row(
            "SELECT address, port FROM destinations WHERE destination_id = ?1;",
            [destination_id],
            |row| {
                Ok(Endpoint {
                    address: row.get(0)?,
                    port: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(endpoint)
}
