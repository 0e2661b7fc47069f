use atomicwrites::{AtomicFile, OverwriteBehavior::AllowOverwrite};
use chrono::{DateTime, Utc};
use finrec_core::{Error, RecommenderStore, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// On-disk model document: the store's three interaction tables.
///
/// Maps are sorted and item sets are flattened to sorted vectors so that
/// consecutive saves of the same state produce identical files. The
/// similarity cache is intentionally absent; it is recomputed lazily after a
/// load.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub user_transactions: BTreeMap<String, Vec<String>>,
    pub transaction_items: BTreeMap<String, Vec<String>>,
    pub item_transactions: BTreeMap<String, Vec<String>>,
    pub saved_at: DateTime<Utc>,
}

impl ModelSnapshot {
    /// Copy the store's tables into a snapshot, under one shared lock.
    pub fn capture(store: &RecommenderStore) -> Self {
        let tables = store.tables();
        Self {
            user_transactions: tables.user_transactions.into_iter().collect(),
            transaction_items: tables.transaction_items.into_iter().collect(),
            item_transactions: tables.item_transactions.into_iter().collect(),
            saved_at: Utc::now(),
        }
    }

    /// Replace the store's state with this snapshot's tables and reset the
    /// similarity cache.
    pub fn restore_into(self, store: &RecommenderStore) {
        store.restore(
            self.user_transactions,
            self.transaction_items,
            self.item_transactions,
        );
    }
}

/// Saves and loads a recommender model as a JSON document at a fixed path.
pub struct ModelPersistence {
    model_path: PathBuf,
}

impl ModelPersistence {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Serialize the store to the model path, atomically (write to a
    /// temporary file, then rename over the target).
    pub fn save(&self, store: &RecommenderStore) -> Result<()> {
        let snapshot = ModelSnapshot::capture(store);

        if let Some(parent) = self.model_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        AtomicFile::new(&self.model_path, AllowOverwrite)
            .write(|f| serde_json::to_writer_pretty(f, &snapshot))
            .map_err(|e| Error::Storage(e.to_string()))?;

        info!(
            path = %self.model_path.display(),
            users = snapshot.user_transactions.len(),
            transactions = snapshot.transaction_items.len(),
            "model saved"
        );
        Ok(())
    }

    /// Load the model file into the store, replacing its state wholesale.
    ///
    /// Returns `Ok(false)` without touching the store when the file does not
    /// exist. Unreadable or malformed content is an error, and the store's
    /// prior state is left untouched.
    pub fn load(&self, store: &RecommenderStore) -> Result<bool> {
        if !self.model_path.exists() {
            warn!(path = %self.model_path.display(), "no model file, keeping current state");
            return Ok(false);
        }

        let data = std::fs::read_to_string(&self.model_path)?;
        let snapshot: ModelSnapshot =
            serde_json::from_str(&data).map_err(|e| Error::Serialization(e.to_string()))?;

        let users = snapshot.user_transactions.len();
        snapshot.restore_into(store);
        info!(path = %self.model_path.display(), users, "model loaded");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> RecommenderStore {
        let store = RecommenderStore::new();
        store.add_transaction("alice", "t1", ["milk", "bread"]);
        store.add_transaction("alice", "t2", ["eggs"]);
        store.add_transaction("bob", "t1", ["milk", "bread"]);
        store
    }

    #[test]
    fn test_save_then_load_round_trips_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path().join("model.json"));

        let store = sample_store();
        persistence.save(&store).unwrap();

        let restored = RecommenderStore::new();
        assert!(persistence.load(&restored).unwrap());

        assert_eq!(restored.transactions_of_user("alice"), vec!["t1", "t2"]);
        assert_eq!(restored.transactions_of_user("bob"), vec!["t1"]);
        assert_eq!(restored.items_of_transaction("t1"), vec!["bread", "milk"]);
        assert_eq!(restored.items_of_transaction("t2"), vec!["eggs"]);
        assert_eq!(restored.transactions_of_item("milk"), vec!["t1", "t1"]);
        // The cache starts cold after a load.
        assert_eq!(restored.cached_similarity_count(), 0);
    }

    #[test]
    fn test_load_missing_file_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path().join("absent.json"));

        let store = sample_store();
        assert!(!persistence.load(&store).unwrap());
        // Prior state untouched.
        assert!(store.contains_user("alice"));
        assert_eq!(store.user_count(), 2);
    }

    #[test]
    fn test_load_malformed_file_errors_and_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();

        let persistence = ModelPersistence::new(&path);
        let store = sample_store();
        let err = persistence.load(&store).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(store.contains_user("alice"));
        assert_eq!(store.transactions_of_user("alice"), vec!["t1", "t2"]);
    }

    #[test]
    fn test_consecutive_saves_are_byte_stable_apart_from_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path().join("model.json"));
        let store = sample_store();

        persistence.save(&store).unwrap();
        let first: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(persistence.model_path()).unwrap())
                .unwrap();
        persistence.save(&store).unwrap();
        let second: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(persistence.model_path()).unwrap())
                .unwrap();

        assert_eq!(first["user_transactions"], second["user_transactions"]);
        assert_eq!(first["transaction_items"], second["transaction_items"]);
        assert_eq!(first["item_transactions"], second["item_transactions"]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path().join("nested/deep/model.json"));
        persistence.save(&sample_store()).unwrap();
        assert!(persistence.model_path().exists());
    }
}
