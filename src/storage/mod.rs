// Storage module: the history store interface and its SQLite backend.

pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::model::{History, Observation, StorageError};
use std::collections::HashSet;

/// Append-only persistence of price histories, keyed by product identifier.
pub trait HistoryStore {
    /// Appends `observation` to the history of `id`, creating it on first use.
    /// `title` and `source_url` replace the stored values on every call.
    fn append(
        &mut self,
        id: &str,
        observation: Observation,
        title: &str,
        source_url: &str,
    ) -> Result<(), StorageError>;

    /// Returns the complete history, or `None` when `id` was never tracked.
    fn get(&self, id: &str) -> Result<Option<History>, StorageError>;

    fn list_identifiers(&self) -> Result<HashSet<String>, StorageError>;
}
