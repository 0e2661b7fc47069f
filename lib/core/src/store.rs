use crate::similarity::jaccard;
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of similar users consulted by the recommendation queries.
pub const DEFAULT_TOP_K: usize = 5;

/// Exclusion rule used by [`RecommenderStore::history_recommendations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryExclusion {
    /// Look the user id up in the transaction->items table and exclude that
    /// entry's items. A user id only matches when it collides with a
    /// transaction id, so this is usually a no-op.
    TransactionKey,
    /// Exclude every item the user has already bought, the same rule the
    /// similarity-weighted recommendations apply.
    OwnedItems,
}

/// Configuration for a recommender store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub history_exclusion: HistoryExclusion,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_exclusion: HistoryExclusion::OwnedItems,
        }
    }
}

#[derive(Default)]
struct StoreState {
    /// user id -> transaction ids, in insertion (chronological) order.
    user_transactions: AHashMap<String, Vec<String>>,
    /// transaction id -> item set. Re-adding a transaction overwrites it.
    transaction_items: AHashMap<String, AHashSet<String>>,
    /// item id -> transaction ids. Appended pass-through, duplicates kept.
    item_transactions: AHashMap<String, Vec<String>>,
}

impl StoreState {
    /// Union of the item sets across all of the user's transactions.
    /// A transaction id with no recorded item set counts as empty.
    fn owned_items(&self, user_id: &str) -> AHashSet<String> {
        let mut owned = AHashSet::new();
        for transaction_id in self.transactions(user_id) {
            if let Some(items) = self.transaction_items.get(transaction_id) {
                owned.extend(items.iter().cloned());
            }
        }
        owned
    }

    fn transactions(&self, user_id: &str) -> &[String] {
        self.user_transactions
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Copy of the three interaction tables, taken under a single shared lock.
///
/// Item sets are flattened to sorted vectors so the copy is deterministic.
#[derive(Debug, Clone, Default)]
pub struct StoreTables {
    pub user_transactions: Vec<(String, Vec<String>)>,
    pub transaction_items: Vec<(String, Vec<String>)>,
    pub item_transactions: Vec<(String, Vec<String>)>,
}

/// Transaction-based collaborative-filtering recommender.
///
/// Holds per-user transaction history, per-transaction item sets, and a
/// derived item->transaction index, plus a cache of pairwise user similarity.
/// Similarity is Jaccard over transaction-id sets; recommendations rank the
/// purchases of the most similar users, skipping items the querying user
/// already owns.
///
/// All methods take `&self`; internal state lives behind
/// [`parking_lot::RwLock`] so a store wrapped in an `Arc` can be shared
/// across request handlers. Writers ([`add_transaction`] and [`restore`])
/// take exclusive locks and clear the similarity cache inside their critical
/// section; queries take shared locks.
///
/// [`add_transaction`]: RecommenderStore::add_transaction
/// [`restore`]: RecommenderStore::restore
pub struct RecommenderStore {
    config: StoreConfig,
    state: RwLock<StoreState>,
    // Keyed under both orderings of each user pair. Lock order: state first.
    similarity: RwLock<AHashMap<(String, String), f64>>,
}

impl RecommenderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            state: RwLock::new(StoreState::default()),
            similarity: RwLock::new(AHashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record a transaction for a user.
    ///
    /// Appends the transaction id to the user's history, overwrites the
    /// transaction's item set (duplicates within `items` collapse), and
    /// appends the transaction id to each item's transaction list. Re-adding
    /// an existing transaction id appends again to the affected item lists;
    /// those duplicates are kept as-is.
    ///
    /// Any new transaction may invalidate any previously computed pairwise
    /// similarity, so the whole cache is cleared rather than patched.
    pub fn add_transaction<I, S>(&self, user_id: &str, transaction_id: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let item_set: AHashSet<String> = items.into_iter().map(Into::into).collect();

        let mut state = self.state.write();
        state
            .user_transactions
            .entry(user_id.to_string())
            .or_default()
            .push(transaction_id.to_string());
        for item in &item_set {
            state
                .item_transactions
                .entry(item.clone())
                .or_default()
                .push(transaction_id.to_string());
        }
        state
            .transaction_items
            .insert(transaction_id.to_string(), item_set);

        // Cleared while still holding the state write lock so readers never
        // observe new transactions alongside stale similarity scores.
        self.similarity.write().clear();
        debug!(
            user = user_id,
            transaction = transaction_id,
            "transaction recorded, similarity cache cleared"
        );
    }

    /// Jaccard similarity between two users' transaction-id sets, in [0, 1].
    ///
    /// Symmetric in its arguments. Returns 0.0 without caching when either
    /// user has no transactions; otherwise the result is cached under both
    /// orderings of the pair until the next write.
    pub fn user_similarity(&self, user1: &str, user2: &str) -> f64 {
        let state = self.state.read();
        self.user_similarity_locked(&state, user1, user2)
    }

    fn user_similarity_locked(&self, state: &StoreState, user1: &str, user2: &str) -> f64 {
        if let Some(&cached) = self
            .similarity
            .read()
            .get(&(user1.to_string(), user2.to_string()))
        {
            return cached;
        }

        let transactions1 = state.transactions(user1);
        let transactions2 = state.transactions(user2);
        if transactions1.is_empty() || transactions2.is_empty() {
            return 0.0;
        }

        let set1: AHashSet<String> = transactions1.iter().cloned().collect();
        let set2: AHashSet<String> = transactions2.iter().cloned().collect();
        let score = jaccard(&set1, &set2);

        let mut cache = self.similarity.write();
        cache.insert((user1.to_string(), user2.to_string()), score);
        cache.insert((user2.to_string(), user1.to_string()), score);
        score
    }

    /// Rank unseen items for a user from the purchases of similar users.
    ///
    /// The `k` most similar users (similarity descending, user id ascending
    /// on ties) each contribute their similarity score to every item in
    /// every one of their transactions, skipping items the querying user
    /// already owns. The result is ordered by accumulated score descending,
    /// item id ascending on ties, and is NOT truncated to `k`: `k` bounds
    /// the similar-user pool, not the item list.
    ///
    /// An unknown user yields an empty list.
    pub fn recommendations(&self, user_id: &str, k: usize) -> Vec<String> {
        let state = self.state.read();
        if !state.user_transactions.contains_key(user_id) {
            debug!(user = user_id, "unknown user, no recommendations");
            return Vec::new();
        }

        let mut similar_users: Vec<(String, f64)> = Vec::new();
        for other_user in state.user_transactions.keys() {
            if other_user == user_id {
                continue;
            }
            let score = self.user_similarity_locked(&state, user_id, other_user);
            if score > 0.0 {
                similar_users.push((other_user.clone(), score));
            }
        }
        similar_users.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let owned = state.owned_items(user_id);

        let mut scores: AHashMap<String, f64> = AHashMap::new();
        for (other_user, score) in similar_users.iter().take(k) {
            for transaction_id in state.transactions(other_user) {
                let Some(items) = state.transaction_items.get(transaction_id) else {
                    continue;
                };
                for item in items {
                    if !owned.contains(item) {
                        *scores.entry(item.clone()).or_insert(0.0) += *score;
                    }
                }
            }
        }

        let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.into_iter().map(|(item, _)| item).collect()
    }

    /// [`recommendations`] filtered to items priced at or under `budget`.
    ///
    /// Items missing from the price table are dropped. Relative order is
    /// preserved; there is no re-ranking by price.
    ///
    /// [`recommendations`]: RecommenderStore::recommendations
    pub fn budget_recommendations(
        &self,
        user_id: &str,
        budget: f64,
        item_prices: &std::collections::HashMap<String, f64>,
        k: usize,
    ) -> Vec<String> {
        self.recommendations(user_id, k)
            .into_iter()
            .filter(|item| item_prices.get(item).is_some_and(|price| *price <= budget))
            .collect()
    }

    /// Rank items by how often other users bought them.
    ///
    /// Counts one occurrence per (other user, transaction) pair containing
    /// the item, excludes items per the configured [`HistoryExclusion`],
    /// orders by count descending (item id ascending on ties), and returns
    /// at most `k` items. An unknown user yields an empty list.
    pub fn history_recommendations(&self, user_id: &str, k: usize) -> Vec<String> {
        let state = self.state.read();
        if !state.user_transactions.contains_key(user_id) {
            debug!(user = user_id, "unknown user, no history recommendations");
            return Vec::new();
        }

        let excluded = match self.config.history_exclusion {
            HistoryExclusion::TransactionKey => state
                .transaction_items
                .get(user_id)
                .cloned()
                .unwrap_or_default(),
            HistoryExclusion::OwnedItems => state.owned_items(user_id),
        };

        let mut frequency: AHashMap<String, u64> = AHashMap::new();
        for (other_user, transactions) in &state.user_transactions {
            if other_user == user_id {
                continue;
            }
            for transaction_id in transactions {
                let Some(items) = state.transaction_items.get(transaction_id) else {
                    continue;
                };
                for item in items {
                    if !excluded.contains(item) {
                        *frequency.entry(item.clone()).or_insert(0) += 1;
                    }
                }
            }
        }

        let mut ranked: Vec<(String, u64)> = frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked.into_iter().map(|(item, _)| item).collect()
    }

    /// Replace the three interaction tables wholesale and reset the
    /// similarity cache. Used when loading a saved model.
    pub fn restore<U, T, I>(&self, user_transactions: U, transaction_items: T, item_transactions: I)
    where
        U: IntoIterator<Item = (String, Vec<String>)>,
        T: IntoIterator<Item = (String, Vec<String>)>,
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut state = self.state.write();
        state.user_transactions = user_transactions.into_iter().collect();
        state.transaction_items = transaction_items
            .into_iter()
            .map(|(transaction_id, items)| (transaction_id, items.into_iter().collect()))
            .collect();
        state.item_transactions = item_transactions.into_iter().collect();
        self.similarity.write().clear();
        debug!(
            users = state.user_transactions.len(),
            transactions = state.transaction_items.len(),
            items = state.item_transactions.len(),
            "store state replaced"
        );
    }

    /// Copy the three interaction tables out under one shared lock.
    pub fn tables(&self) -> StoreTables {
        let state = self.state.read();
        StoreTables {
            user_transactions: state
                .user_transactions
                .iter()
                .map(|(user, transactions)| (user.clone(), transactions.clone()))
                .collect(),
            transaction_items: state
                .transaction_items
                .iter()
                .map(|(transaction_id, items)| {
                    let mut items: Vec<String> = items.iter().cloned().collect();
                    items.sort();
                    (transaction_id.clone(), items)
                })
                .collect(),
            item_transactions: state
                .item_transactions
                .iter()
                .map(|(item, transactions)| (item.clone(), transactions.clone()))
                .collect(),
        }
    }

    // Unknown keys read as empty containers throughout; nothing is created
    // on lookup.

    #[must_use]
    pub fn contains_user(&self, user_id: &str) -> bool {
        self.state.read().user_transactions.contains_key(user_id)
    }

    #[must_use]
    pub fn user_ids(&self) -> Vec<String> {
        self.state.read().user_transactions.keys().cloned().collect()
    }

    #[must_use]
    pub fn transaction_ids(&self) -> Vec<String> {
        self.state.read().transaction_items.keys().cloned().collect()
    }

    #[must_use]
    pub fn item_ids(&self) -> Vec<String> {
        self.state.read().item_transactions.keys().cloned().collect()
    }

    /// Transaction ids recorded for a user, in insertion order.
    #[must_use]
    pub fn transactions_of_user(&self, user_id: &str) -> Vec<String> {
        self.state.read().transactions(user_id).to_vec()
    }

    /// Items in a transaction, sorted for determinism.
    #[must_use]
    pub fn items_of_transaction(&self, transaction_id: &str) -> Vec<String> {
        let state = self.state.read();
        let mut items: Vec<String> = state
            .transaction_items
            .get(transaction_id)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default();
        items.sort();
        items
    }

    /// Transactions an item appeared in, in insertion order.
    #[must_use]
    pub fn transactions_of_item(&self, item_id: &str) -> Vec<String> {
        self.state
            .read()
            .item_transactions
            .get(item_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.state.read().user_transactions.len()
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.state.read().transaction_items.len()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.state.read().item_transactions.len()
    }

    /// Number of cached similarity entries (both orderings counted).
    #[must_use]
    pub fn cached_similarity_count(&self) -> usize {
        self.similarity.read().len()
    }
}

impl Default for RecommenderStore {
    fn default() -> Self {
        Self::new()
    }
}
