//! # finrec
//!
//! A transaction-based collaborative-filtering recommender for
//! personal-finance assistants.
//!
//! finrec models user-item interactions through transactions: each user owns
//! an ordered transaction history, each transaction an item set. Users are
//! compared by Jaccard similarity over the transaction ids they share, with
//! results cached until the next write, and items are ranked for a user from
//! what similar users bought. Rankings can be filtered by a budget against a
//! price table or replaced by a cross-user purchase-frequency ranking.
//!
//! ## Quick Start
//!
//! ```rust
//! use finrec::prelude::*;
//!
//! let store = RecommenderStore::new();
//! store.add_transaction("alice", "t1", ["milk", "bread"]);
//! store.add_transaction("bob", "t1", ["milk", "bread"]);
//! store.add_transaction("bob", "t2", ["eggs", "coffee"]);
//!
//! let recs = store.recommendations("alice", DEFAULT_TOP_K);
//! assert_eq!(recs, vec!["coffee".to_string(), "eggs".to_string()]);
//! ```
//!
//! Models persist as stable JSON documents:
//!
//! ```rust,no_run
//! use finrec::prelude::*;
//!
//! # fn main() -> finrec::Result<()> {
//! let store = RecommenderStore::new();
//! let persistence = ModelPersistence::new("./finrec-model.json");
//! persistence.load(&store)?;
//! store.add_transaction("alice", "t3", ["tea"]);
//! persistence.save(&store)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `finrec-core` - interaction store, similarity math, ranking
//! - `finrec-storage` - model snapshots and atomic file persistence

// Re-export core types
pub use finrec_core::{
    jaccard, Error, HistoryExclusion, RecommenderStore, Result, StoreConfig, StoreTables,
    DEFAULT_TOP_K,
};

// Re-export storage
pub use finrec_storage::{ModelPersistence, ModelSnapshot};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Error, HistoryExclusion, ModelPersistence, ModelSnapshot, RecommenderStore, Result,
        StoreConfig, StoreTables, DEFAULT_TOP_K,
    };
}
