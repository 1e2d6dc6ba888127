//! Batch deduplication against the store.
//!
//! Partition newly extracted jobs into inserts (url unseen) and refreshes
//! (url already stored). Within a batch the first occurrence of a URL
//! wins; across runs the repository's refresh path guarantees user- and
//! scorer-owned fields survive.

use std::collections::HashSet;

use crate::domain::models::NewJob;

#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub inserts: Vec<NewJob>,
    pub updates: Vec<NewJob>,
}

/// Split a batch by URL presence in the store. `existing` is the set of
/// URLs the store already holds (see `JobRepository::urls_present`).
pub fn partition_by_url(batch: Vec<NewJob>, existing: &HashSet<String>) -> DedupOutcome {
    let mut outcome = DedupOutcome::default();
    let mut seen_in_batch = HashSet::new();

    for job in batch {
        if !seen_in_batch.insert(job.url.clone()) {
            log::debug!("[DEDUP] Dropping duplicate within batch: {}", job.url);
            continue;
        }

        if existing.contains(&job.url) {
            outcome.updates.push(job);
        } else {
            outcome.inserts.push(job);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    #[test]
    fn test_partition_splits_on_store_presence() {
        let batch = vec![
            fixtures::new_job("https://a.example.com/1"),
            fixtures::new_job("https://a.example.com/2"),
        ];
        let existing: HashSet<String> = ["https://a.example.com/2".to_string()].into();

        let outcome = partition_by_url(batch, &existing);
        assert_eq!(outcome.inserts.len(), 1);
        assert_eq!(outcome.inserts[0].url, "https://a.example.com/1");
        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(outcome.updates[0].url, "https://a.example.com/2");
    }

    #[test]
    fn test_duplicates_within_batch_collapse_to_first() {
        let mut first = fixtures::new_job("https://a.example.com/1");
        first.title = "first occurrence".into();
        let mut second = fixtures::new_job("https://a.example.com/1");
        second.title = "second occurrence".into();

        let outcome = partition_by_url(vec![first, second], &HashSet::new());
        assert_eq!(outcome.inserts.len(), 1);
        assert_eq!(outcome.inserts[0].title, "first occurrence");
        assert!(outcome.updates.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let outcome = partition_by_url(Vec::new(), &HashSet::new());
        assert!(outcome.inserts.is_empty());
        assert!(outcome.updates.is_empty());
    }
}
