//! Set-overlap similarity measures.
//!
//! The recommender compares users by the transaction ids they own, not by the
//! items inside those transactions. Two users who bought identical groceries
//! in separate transactions have similarity 0.0.

use ahash::AHashSet;

/// Jaccard coefficient between two id sets: intersection over union.
///
/// Returns a score in [0.0, 1.0]. An empty union yields 0.0 rather than a
/// division by zero.
pub fn jaccard(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> AHashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaccard_identical_sets() {
        let a = set(&["t1", "t2"]);
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn test_jaccard_disjoint_sets() {
        let a = set(&["t1", "t2"]);
        let b = set(&["t3"]);
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        let a = set(&["t1", "t2", "t3"]);
        let b = set(&["t2", "t3", "t4"]);
        assert_eq!(jaccard(&a, &b), 0.5); // 2 shared of 4 total
    }

    #[test]
    fn test_jaccard_empty_sets() {
        let empty = set(&[]);
        assert_eq!(jaccard(&empty, &empty), 0.0);
        assert_eq!(jaccard(&empty, &set(&["t1"])), 0.0);
    }

    #[test]
    fn test_jaccard_symmetric() {
        let a = set(&["t1", "t2"]);
        let b = set(&["t2", "t3", "t4"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
    }
}
