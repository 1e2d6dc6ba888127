//! Domain entities shared by the pipelines, the store, and the CLI.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ====== Enums ======

/// Application-tracking status, owned by the user. Discovery never touches
/// this once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    New,
    Reviewed,
    Applied,
    Interviewing,
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Reviewed => "reviewed",
            JobStatus::Applied => "applied",
            JobStatus::Interviewing => "interviewing",
            JobStatus::Rejected => "rejected",
        }
    }

    pub const ALL: [JobStatus; 5] = [
        JobStatus::New,
        JobStatus::Reviewed,
        JobStatus::Applied,
        JobStatus::Interviewing,
        JobStatus::Rejected,
    ];
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(JobStatus::New),
            "reviewed" => Ok(JobStatus::Reviewed),
            "applied" => Ok(JobStatus::Applied),
            "interviewing" => Ok(JobStatus::Interviewing),
            "rejected" => Ok(JobStatus::Rejected),
            other => Err(format!(
                "unknown status '{}' (expected one of: new, reviewed, applied, interviewing, rejected)",
                other
            )),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ====== Entities ======

/// A stored job posting.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: i64,
    pub url: String,
    pub company: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub posted_date: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub match_score: Option<i64>,
    pub match_reasoning: Option<String>,
    pub status: JobStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_high_match(&self) -> bool {
        self.match_score
            .is_some_and(|s| s >= crate::config::MIN_MATCH_SCORE)
    }
}

/// A job as extracted by the discovery pipeline, before it has a store
/// identity. Only descriptive fields: status, notes and score belong to
/// later stages.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub url: String,
    pub company: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub posted_date: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// Result of writing one discovered job to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

/// Aggregate store statistics for the stats view.
#[derive(Debug, Clone, Serialize)]
pub struct JobStats {
    pub total: i64,
    pub unscored: i64,
    pub average_score: Option<f64>,
    pub by_status: Vec<(String, i64)>,
    pub by_company: Vec<(String, i64)>,
}

/// Filters for listing jobs; all optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub min_score: Option<i64>,
    pub company: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("Applied".parse::<JobStatus>().unwrap(), JobStatus::Applied);
        assert!("archived".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_upsert_outcome_id() {
        assert_eq!(UpsertOutcome::Inserted(3).id(), 3);
        assert_eq!(UpsertOutcome::Updated(9).id(), 9);
    }
}
