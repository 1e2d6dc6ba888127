//! Discovery pipeline orchestration.
//!
//! Coordinates the full run for one trigger:
//! 1. Build the query sequence from configuration
//! 2. Run each search through the shared-throttle executor
//! 3. Parse result pages into candidate links
//! 4. Fetch and extract each job page
//! 5. Filter by location, dedup against the store, write
//!
//! Queries are processed sequentially: the fetch service enforces
//! per-account rate limits, so the design trades wall-clock time for
//! request-budget safety. Per-item failures are counted, never escalated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::repository::JobRepository;
use crate::service::dedup::partition_by_url;
use crate::service::extractor::extract_job;
use crate::service::location::LocationFilter;
use crate::service::query_builder::{build_queries, SearchQuery};
use crate::service::search::SearchExecutor;
use crate::service::serp::parse_results;
use crate::service::tasks::TaskTracker;

/// Outcome counts for one discovery run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    /// Candidate result links seen across all queries
    pub discovered: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Location-filtered or unextractable entries
    pub skipped: usize,
    /// Failed queries and failed store writes
    pub failed: usize,
}

pub struct DiscoveryRunner {
    executor: SearchExecutor,
    repo: JobRepository,
    config: SearchConfig,
    location_filter: LocationFilter,
}

impl DiscoveryRunner {
    pub fn new(executor: SearchExecutor, repo: JobRepository, config: SearchConfig) -> Self {
        let location_filter = LocationFilter::new(&config.locations);
        Self {
            executor,
            repo,
            config,
            location_filter,
        }
    }

    /// Run discovery to completion, reporting progress per query. The
    /// cancel flag is observed between queries and between detail fetches;
    /// each job row is written with a single statement, so a cancelled run
    /// never leaves a partial row.
    pub async fn run(&self, tracker: &TaskTracker, task_id: &str) -> Result<RunReport> {
        self.config.validate()?;

        let queries: Vec<SearchQuery> = build_queries(&self.config).collect();
        let total = queries.len();
        let cancel_flag = tracker.cancel_flag(task_id);

        log::info!("[DISCOVERY] Starting run with {} queries", total);
        let mut report = RunReport::default();

        for (idx, query) in queries.iter().enumerate() {
            if cancel_flag.load(Ordering::Relaxed) {
                log::warn!("[DISCOVERY] Run cancelled at query {}/{}", idx, total);
                break;
            }

            tracker.report_progress(task_id, idx, total, &query.label());

            match self.process_query(query, &cancel_flag, &mut report).await {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    log::warn!("[DISCOVERY] Query '{}' failed: {}", query.label(), e);
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }

            tracker.report_progress(task_id, idx + 1, total, &query.label());
        }

        log::info!(
            "[DISCOVERY] Run complete: {} discovered, {} inserted, {} updated, {} skipped, {} failed",
            report.discovered,
            report.inserted,
            report.updated,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// One query end to end: search, parse, extract, filter, write.
    async fn process_query(
        &self,
        query: &SearchQuery,
        cancel_flag: &Arc<AtomicBool>,
        report: &mut RunReport,
    ) -> Result<()> {
        let payload = self.executor.search(query).await?;
        let entries = parse_results(&payload, &self.config.included_sites);
        log::info!(
            "[DISCOVERY] Query '{}' yielded {} candidate links",
            query.label(),
            entries.len()
        );
        report.discovered += entries.len();

        let mut batch = Vec::new();
        for entry in entries.into_iter().take(query.max_results) {
            if cancel_flag.load(Ordering::Relaxed) {
                break;
            }

            let html = match self.executor.fetch_page(&entry.url).await {
                Ok(html) => html,
                Err(e) => {
                    log::debug!("[DISCOVERY] Skipping {}: {}", entry.url, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let Some(job) = extract_job(&entry, &html) else {
                log::debug!("[DISCOVERY] No extractable job at {}", entry.url);
                report.skipped += 1;
                continue;
            };

            if !self.location_filter.is_match(&job.location) {
                log::debug!(
                    "[DISCOVERY] Skipping {} (location: {})",
                    job.title,
                    job.location
                );
                report.skipped += 1;
                continue;
            }

            log::info!("[DISCOVERY] Extracted: {} at {}", job.title, job.company);
            batch.push(job.into_new_job());
        }

        self.write_batch(batch, report).await;
        Ok(())
    }

    /// Dedup the batch against the store and persist it. A failed write
    /// affects only that job; it was never marked processed, so the next
    /// run retries it.
    async fn write_batch(&self, batch: Vec<crate::domain::models::NewJob>, report: &mut RunReport) {
        if batch.is_empty() {
            return;
        }

        let urls: Vec<String> = batch.iter().map(|j| j.url.clone()).collect();
        let existing = match self.repo.urls_present(&urls).await {
            Ok(existing) => existing,
            Err(e) => {
                log::error!("[DISCOVERY] Failed to check existing urls: {}", e);
                report.failed += batch.len();
                return;
            }
        };

        let outcome = partition_by_url(batch, &existing);

        for job in &outcome.inserts {
            match self.repo.insert(job).await {
                Ok(_) => report.inserted += 1,
                Err(e) => {
                    log::error!("[DISCOVERY] Failed to insert {}: {}", job.url, e);
                    report.failed += 1;
                }
            }
        }

        for job in &outcome.updates {
            match self.repo.refresh(job).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    log::error!("[DISCOVERY] Failed to refresh {}: {}", job.url, e);
                    report.failed += 1;
                }
            }
        }
    }
}
