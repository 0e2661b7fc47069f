//! # finrec Storage
//!
//! Persistence layer for the finrec recommender: serializes the store's
//! interaction tables to a stable JSON document and restores them, resetting
//! the similarity cache on load.

pub mod persistence;

pub use persistence::{ModelPersistence, ModelSnapshot};
