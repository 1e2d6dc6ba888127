//! Shared fixtures and mocks for unit tests.

#[cfg(test)]
pub mod fixtures {
    use chrono::Utc;
    use sqlx::SqlitePool;

    use crate::domain::models::{Job, JobStatus, NewJob};

    /// Creates an in-memory SQLite database with migrations applied
    pub async fn setup_test_db() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    /// A discovered job with sensible defaults, keyed by URL.
    pub fn new_job(url: &str) -> NewJob {
        NewJob {
            url: url.to_string(),
            company: "Acme Corp".to_string(),
            title: "Data Engineer".to_string(),
            location: "Remote".to_string(),
            description: "Build and operate data pipelines.".to_string(),
            posted_date: None,
            scraped_at: Utc::now(),
        }
    }

    /// A stored job for tests that don't need a database round trip.
    pub fn job_with_id(id: i64, url: &str) -> Job {
        Job {
            id,
            url: url.to_string(),
            company: "Acme Corp".to_string(),
            title: "Data Engineer".to_string(),
            location: "Remote".to_string(),
            description: "Build and operate data pipelines.".to_string(),
            posted_date: None,
            scraped_at: Utc::now(),
            match_score: None,
            match_reasoning: None,
            status: JobStatus::New,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
