use crate::model::{History, Observation, ObservationError, StorageError};
use crate::storage::HistoryStore;
use crate::utils::parse_datetime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use tracing::info;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file and creates the schema if needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                source_url TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS observations (
                product_id TEXT NOT NULL REFERENCES products(id),
                seq INTEGER NOT NULL,
                price REAL NOT NULL,
                currency TEXT NOT NULL,
                observed_at TEXT NOT NULL,
                PRIMARY KEY (product_id, seq)
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Maps an observation row, failing on values no writer would have stored.
    fn map_observation(row: &Row) -> Result<Observation, rusqlite::Error> {
        let price: f64 = row.get(0)?;
        let currency: String = row.get(1)?;
        let observed_at: String = row.get(2)?;

        let timestamp = parse_datetime(&observed_at).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("invalid timestamp '{}'", observed_at).into(),
            )
        })?;

        let observation = Observation {
            price,
            currency,
            timestamp,
        };
        observation.validate().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Real, Box::new(e))
        })?;
        Ok(observation)
    }

    fn corrupt(id: &str, err: rusqlite::Error) -> StorageError {
        match err {
            rusqlite::Error::FromSqlConversionFailure(_, _, cause) => StorageError::Corrupt {
                id: id.to_string(),
                reason: cause.to_string(),
            },
            other => StorageError::Database(other),
        }
    }

    fn load_observations(conn: &Connection, id: &str) -> Result<Vec<Observation>, StorageError> {
        let mut stmt = conn.prepare(
            "SELECT price, currency, observed_at FROM observations
             WHERE product_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![id], Self::map_observation)?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row.map_err(|e| Self::corrupt(id, e))?);
        }
        Ok(observations)
    }
}

impl HistoryStore for SqliteStorage {
    fn append(
        &mut self,
        id: &str,
        observation: Observation,
        title: &str,
        source_url: &str,
    ) -> Result<(), StorageError> {
        if id.trim().is_empty() {
            return Err(ObservationError::EmptyIdentifier.into());
        }
        observation.validate()?;

        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row("SELECT 1 FROM products WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();

        let next_seq: i64 = if exists {
            // Read the whole stored series so a damaged record blocks the write.
            let stored = Self::load_observations(&tx, id)?;
            if let Some(last) = stored.last() {
                if observation.timestamp < last.timestamp {
                    return Err(ObservationError::OutOfOrder {
                        last: last.timestamp,
                        new: observation.timestamp,
                    }
                    .into());
                }
            }
            tx.execute(
                "UPDATE products SET title = ?2, source_url = ?3 WHERE id = ?1",
                params![id, title, source_url],
            )?;
            tx.query_row(
                "SELECT COALESCE(MAX(seq), -1) + 1 FROM observations WHERE product_id = ?1",
                params![id],
                |row| row.get(0),
            )?
        } else {
            tx.execute(
                "INSERT INTO products (id, title, source_url) VALUES (?1, ?2, ?3)",
                params![id, title, source_url],
            )?;
            0
        };

        tx.execute(
            "INSERT INTO observations (product_id, seq, price, currency, observed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                next_seq,
                observation.price,
                &observation.currency,
                observation.timestamp.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        info!("Saved price data for {} (observation #{})", id, next_seq + 1);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<History>, StorageError> {
        let product = self
            .conn
            .query_row(
                "SELECT title, source_url FROM products WHERE id = ?1",
                params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((title, source_url)) = product else {
            return Ok(None);
        };

        let observations = Self::load_observations(&self.conn, id)?;
        Ok(Some(History {
            id: id.to_string(),
            title,
            source_url,
            observations,
        }))
    }

    fn list_identifiers(&self) -> Result<HashSet<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT id FROM products")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }
}
