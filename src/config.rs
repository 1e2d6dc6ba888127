//! Search configuration and credential loading.
//!
//! The search config is a JSON file edited by the user; credentials come
//! from the environment. Validation happens at load time so a bad config
//! aborts a run before any request is made.

use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Seconds between outbound requests through the scraping proxy.
pub const REQUEST_DELAY_MS: u64 = 2000;

/// Match score (0-100) at or above which a job is flagged as high priority.
pub const MIN_MATCH_SCORE: i64 = 70;

/// How many jobs are scored concurrently. The AI service has its own
/// rate and cost limits, so this stays small.
pub const SCORING_CONCURRENCY: usize = 3;

pub const SCRAPERAPI_KEY_VAR: &str = "SCRAPERAPI_KEY";
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Google date-range restriction for search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    PastDay,
    #[default]
    PastWeek,
    PastMonth,
    Any,
}

impl DateRange {
    /// Google `tbs` query parameter code, if the range restricts at all.
    pub fn tbs_code(&self) -> Option<&'static str> {
        match self {
            DateRange::PastDay => Some("qdr:d"),
            DateRange::PastWeek => Some("qdr:w"),
            DateRange::PastMonth => Some("qdr:m"),
            DateRange::Any => None,
        }
    }
}

/// User-editable search parameters. One search request is issued per
/// (keyword, location) combination.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub included_sites: Vec<String>,
    #[serde(default)]
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub max_salary: Option<i64>,
    #[serde(default)]
    pub experience_levels: Vec<String>,
    #[serde(default = "default_results_per_search")]
    pub results_per_search: usize,
}

fn default_results_per_search() -> usize {
    20
}

impl SearchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let config: SearchConfig = serde_json::from_str(&raw).map_err(|e| {
            AppError::config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::config("no search keywords configured"));
        }
        if self.locations.iter().all(|l| l.trim().is_empty()) {
            return Err(AppError::config("no target locations configured"));
        }
        if self.results_per_search == 0 {
            return Err(AppError::config("results_per_search must be at least 1"));
        }
        Ok(())
    }
}

/// Read a required credential from the environment.
pub fn credential_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() && value != "your_key_here" => Ok(value),
        _ => Err(AppError::config(format!("{} is not set", var))),
    }
}
