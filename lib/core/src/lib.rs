//! # finrec Core
//!
//! Core library for the finrec recommender.
//!
//! This crate provides the in-memory interaction store and ranking logic:
//!
//! - [`RecommenderStore`] - user/transaction/item tables with a cached
//!   pairwise user-similarity matrix
//! - [`similarity::jaccard`] - set-overlap coefficient the store is built on
//! - [`Error`] / [`Result`] - shared error type across the workspace
//!
//! Users are compared by the transaction ids they share, not by item
//! overlap: two users are similar when they participated in the same
//! transactions (a shared household purchase, a split bill), and the store
//! recommends what similar users bought that the querying user has not.
//!
//! ## Example
//!
//! ```rust
//! use finrec_core::{RecommenderStore, DEFAULT_TOP_K};
//!
//! let store = RecommenderStore::new();
//! store.add_transaction("alice", "t1", ["milk", "bread"]);
//! store.add_transaction("bob", "t1", ["milk", "bread"]);
//! store.add_transaction("bob", "t2", ["eggs"]);
//!
//! // alice and bob share t1, so bob's other purchases rank for alice.
//! let recs = store.recommendations("alice", DEFAULT_TOP_K);
//! assert_eq!(recs, vec!["eggs".to_string()]);
//! ```

pub mod error;
pub mod similarity;
pub mod store;

pub use error::{Error, Result};
pub use similarity::jaccard;
pub use store::{
    HistoryExclusion, RecommenderStore, StoreConfig, StoreTables, DEFAULT_TOP_K,
};
