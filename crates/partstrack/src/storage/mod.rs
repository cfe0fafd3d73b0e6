//! Storage layer for partstrack.
//!
//! Parts live in a keyed record store. [`Storage`] is the `SQLite` backend used
//! by the CLI; [`MemoryStore`] keeps everything in a `HashMap`. Both implement
//! [`PartStore`]: get by id and last-write-wins update by id, nothing more.

mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::part::{Checkpoint, NewPart, Part, PartId, TrackingPhase};
use crate::status::{apply_label, derive_label, StatusFlags};

pub use memory::MemoryStore;

/// Keyed record store for parts.
pub trait PartStore: Send {
    /// Create a part and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn insert(&mut self, part: &NewPart) -> Result<Part>;

    /// Fetch a part by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(&self, id: PartId) -> Result<Option<Part>>;

    /// Overwrite the stored record with `part`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartNotFound`] if no record has the part's id.
    fn update(&mut self, part: &Part) -> Result<()>;

    /// All parts ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list(&self) -> Result<Vec<Part>>;
}

const SELECT_COLUMNS: &str = r"
    SELECT id, name, tracking, purchased, shipped, delivered,
           tracking_status, tracking_checkpoints, tracking_updated_at
    FROM parts
";

/// `SQLite`-backed part store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new part.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, part: &NewPart) -> Result<Part> {
        let flags = apply_label(part.status);
        let tracking = part.tracking.trim();
        self.conn.execute(
            r"
            INSERT INTO parts (name, tracking, purchased, shipped, delivered)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                part.name,
                tracking,
                flags.purchased,
                flags.shipped,
                flags.delivered
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted part with id {}", id);

        let mut created = Part::new(id, part.name.clone());
        created.tracking = tracking.to_string();
        created.status = part.status;
        Ok(created)
    }

    /// Get a part by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: PartId) -> Result<Option<Part>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let result = self
            .conn
            .query_row(&sql, [id], Self::row_to_part)
            .optional()?;
        Ok(result)
    }

    /// Write every field of `part` to its row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartNotFound`] if the row doesn't exist, or an error if
    /// the database operation fails.
    pub fn update(&self, part: &Part) -> Result<()> {
        let flags = apply_label(part.status);
        let checkpoints = serde_json::to_string(&part.tracking_checkpoints)?;
        let tracking_status = part.tracking_status.as_ref().map(TrackingPhase::as_str);
        let updated_at = part.tracking_updated_at.map(|t| t.to_rfc3339());

        let affected = self.conn.execute(
            r"
            UPDATE parts SET
                name = ?2, tracking = ?3,
                purchased = ?4, shipped = ?5, delivered = ?6,
                tracking_status = ?7, tracking_checkpoints = ?8, tracking_updated_at = ?9
            WHERE id = ?1
            ",
            params![
                part.id,
                part.name,
                part.tracking,
                flags.purchased,
                flags.shipped,
                flags.delivered,
                tracking_status,
                checkpoints,
                updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(Error::PartNotFound(part.id));
        }
        debug!("Updated part {}", part.id);
        Ok(())
    }

    /// Get all parts ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Part>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let parts = stmt
            .query_map([], Self::row_to_part)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(parts)
    }

    /// Convert a database row to a Part.
    fn row_to_part(row: &rusqlite::Row) -> rusqlite::Result<Part> {
        let id: PartId = row.get(0)?;
        let flags = StatusFlags::new(row.get(3)?, row.get(4)?, row.get(5)?);
        let tracking_status: Option<String> = row.get(6)?;
        let checkpoints_json: String = row.get(7)?;
        let updated_at: Option<String> = row.get(8)?;

        if !flags.is_consistent() {
            debug!(part_id = id, ?flags, "Normalizing inconsistent status flags");
        }

        let tracking_checkpoints =
            serde_json::from_str::<Vec<Checkpoint>>(&checkpoints_json).unwrap_or_else(|e| {
                warn!(part_id = id, error = %e, "Unreadable checkpoints, treating as empty");
                Vec::new()
            });

        let tracking_updated_at = updated_at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Part {
            id,
            name: row.get(1)?,
            tracking: row.get(2)?,
            status: derive_label(flags),
            tracking_status: tracking_status.map(|s| TrackingPhase::parse(&s)),
            tracking_checkpoints,
            tracking_updated_at,
        })
    }
}

impl PartStore for Storage {
    fn insert(&mut self, part: &NewPart) -> Result<Part> {
        Storage::insert(self, part)
    }

    fn get(&self, id: PartId) -> Result<Option<Part>> {
        Storage::get(self, id)
    }

    fn update(&mut self, part: &Part) -> Result<()> {
        Storage::update(self, part)
    }

    fn list(&self) -> Result<Vec<Part>> {
        Storage::list(self)
    }
}
