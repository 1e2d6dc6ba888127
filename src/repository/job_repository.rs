//! Job store access.
//!
//! The `jobs` table is the single shared state between the discovery and
//! scoring pipelines. The one consistency guarantee lives here: at most one
//! row per canonical URL, and a re-discovery refresh never touches the
//! fields owned by the user or the scoring pipeline (`status`, `notes`,
//! `match_score`, `match_reasoning`).

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::map_job_status;
use crate::domain::models::{Job, JobFilter, JobStats, NewJob, UpsertOutcome};
use crate::error::{AppError, Result};

const JOB_COLUMNS: &str = "id, url, company, title, location, description, posted_date, \
     scraped_at, match_score, match_reasoning, status, notes, created_at, updated_at";

pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a newly discovered job or refresh the existing row for its
    /// URL. Refreshing updates descriptive fields only.
    pub async fn upsert_by_url(&self, job: &NewJob) -> Result<UpsertOutcome> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE url = ?")
            .bind(&job.url)
            .fetch_optional(&self.pool)
            .await?;

        match existing {
            Some(id) => {
                self.refresh(job).await?;
                Ok(UpsertOutcome::Updated(id))
            }
            None => {
                let id = self.insert(job).await?;
                Ok(UpsertOutcome::Inserted(id))
            }
        }
    }

    /// Insert a job that is known not to exist yet. Returns the new row id.
    pub async fn insert(&self, job: &NewJob) -> Result<i64> {
        let scraped_at = job.scraped_at.to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (url, company, title, location, description, posted_date, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.url)
        .bind(&job.company)
        .bind(&job.title)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.posted_date)
        .bind(scraped_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        log::debug!("Inserted job {} ({})", id, job.url);
        Ok(id)
    }

    /// Refresh the descriptive fields of an existing row by URL.
    /// Never touches status, notes, match_score or match_reasoning.
    pub async fn refresh(&self, job: &NewJob) -> Result<()> {
        let scraped_at = job.scraped_at.to_rfc3339();
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE jobs SET
                company = ?,
                title = ?,
                location = ?,
                description = ?,
                posted_date = ?,
                scraped_at = ?,
                updated_at = ?
            WHERE url = ?
            "#,
        )
        .bind(&job.company)
        .bind(&job.title)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.posted_date)
        .bind(scraped_at)
        .bind(now)
        .bind(&job.url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::store(format!(
                "refresh matched no row for url {}",
                job.url
            )));
        }
        log::debug!("Refreshed job ({})", job.url);
        Ok(())
    }

    /// Which of the given URLs already have a stored row.
    pub async fn urls_present(&self, urls: &[String]) -> Result<HashSet<String>> {
        if urls.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders = vec!["?"; urls.len()].join(", ");
        let sql = format!("SELECT url FROM jobs WHERE url IN ({})", placeholders);

        let mut query = sqlx::query(&sql);
        for url in urls {
            query = query.bind(url);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|row| row.get("url")).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Job>> {
        let sql = format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(job_from_row))
    }

    /// Jobs the scoring pipeline has not processed yet. A score of 0 is a
    /// real score; only NULL means unscored.
    pub async fn list_unscored(&self) -> Result<Vec<Job>> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE match_score IS NULL ORDER BY id ASC",
            JOB_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(job_from_row).collect())
    }

    pub async fn update_score(&self, id: i64, score: i64, reasoning: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE jobs SET match_score = ?, match_reasoning = ?, updated_at = ? WHERE id = ?",
        )
        .bind(score)
        .bind(reasoning)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        log::info!("Updated job {} score to {}", id, score);
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: crate::domain::models::JobStatus,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        log::info!("Updated job {} status to {}", id, status);
        Ok(())
    }

    pub async fn update_notes(&self, id: i64, notes: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE jobs SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(notes)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List jobs matching the filter, best score first (unscored last).
    pub async fn list_filtered(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut sql = format!("SELECT {} FROM jobs WHERE 1=1", JOB_COLUMNS);

        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.min_score.is_some() {
            sql.push_str(" AND match_score >= ?");
        }
        if filter.company.is_some() {
            sql.push_str(" AND company LIKE ?");
        }
        sql.push_str(" ORDER BY match_score IS NULL, match_score DESC, id ASC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(min_score) = filter.min_score {
            query = query.bind(min_score);
        }
        if let Some(company) = &filter.company {
            query = query.bind(format!("%{}%", company));
        }
        query = query.bind(filter.limit.unwrap_or(100));

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(job_from_row).collect())
    }

    pub async fn aggregate_stats(&self) -> Result<JobStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;

        let unscored: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE match_score IS NULL")
                .fetch_one(&self.pool)
                .await?;

        let average_score: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(match_score) FROM jobs WHERE match_score IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let by_status = sqlx::query("SELECT status, COUNT(*) AS n FROM jobs GROUP BY status")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.get("status"), row.get("n")))
            .collect();

        let by_company = sqlx::query(
            "SELECT company, COUNT(*) AS n FROM jobs GROUP BY company ORDER BY n DESC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| (row.get("company"), row.get("n")))
        .collect();

        Ok(JobStats {
            total,
            unscored,
            average_score,
            by_status,
            by_company,
        })
    }
}

fn job_from_row(row: sqlx::sqlite::SqliteRow) -> Job {
    Job {
        id: row.get("id"),
        url: row.get("url"),
        company: row.get("company"),
        title: row.get("title"),
        location: row.get("location"),
        description: row.get("description"),
        posted_date: row.get("posted_date"),
        scraped_at: parse_datetime(row.get("scraped_at")),
        match_score: row.get("match_score"),
        match_reasoning: row.get("match_reasoning"),
        status: map_job_status(row.get::<&str, _>("status")),
        notes: row.get("notes"),
        created_at: parse_datetime(row.get("created_at")),
        updated_at: parse_datetime(row.get("updated_at")),
    }
}

fn parse_datetime(s: &str) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime('now') defaults use "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::JobStatus;
    use crate::test_utils::fixtures;

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        let job = fixtures::new_job("https://example.com/jobs/1");
        let outcome = repo.upsert_by_url(&job).await.unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(_)));

        let stored = repo.get_by_id(outcome.id()).await.unwrap().unwrap();
        assert_eq!(stored.url, "https://example.com/jobs/1");
        assert_eq!(stored.company, job.company);
        assert_eq!(stored.status, JobStatus::New);
        assert!(stored.match_score.is_none());
    }

    #[tokio::test]
    async fn test_upsert_same_url_keeps_one_row() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool.clone());

        let first = fixtures::new_job("https://example.com/jobs/1");
        let id = repo.upsert_by_url(&first).await.unwrap().id();

        let mut second = fixtures::new_job("https://example.com/jobs/1");
        second.description = "updated description".into();
        let outcome = repo.upsert_by_url(&second).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated(id));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.description, "updated description");
    }

    #[tokio::test]
    async fn test_refresh_preserves_status_notes_and_score() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        let job = fixtures::new_job("https://example.com/jobs/1");
        let id = repo.upsert_by_url(&job).await.unwrap().id();

        repo.update_status(id, JobStatus::Applied).await.unwrap();
        repo.update_notes(id, "phone screen on Friday").await.unwrap();
        repo.update_score(id, 88, "strong fit").await.unwrap();

        let mut rescrape = fixtures::new_job("https://example.com/jobs/1");
        rescrape.description = "freshly scraped text".into();
        repo.upsert_by_url(&rescrape).await.unwrap();

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.description, "freshly scraped text");
        assert_eq!(stored.status, JobStatus::Applied);
        assert_eq!(stored.notes, "phone screen on Friday");
        assert_eq!(stored.match_score, Some(88));
        assert_eq!(stored.match_reasoning.as_deref(), Some("strong fit"));
    }

    #[tokio::test]
    async fn test_list_unscored_excludes_zero_scores() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        let a = repo
            .upsert_by_url(&fixtures::new_job("https://example.com/jobs/a"))
            .await
            .unwrap()
            .id();
        repo.upsert_by_url(&fixtures::new_job("https://example.com/jobs/b"))
            .await
            .unwrap();

        // A score of zero is a real score, not "not yet scored"
        repo.update_score(a, 0, "no overlap at all").await.unwrap();

        let unscored = repo.list_unscored().await.unwrap();
        assert_eq!(unscored.len(), 1);
        assert_eq!(unscored[0].url, "https://example.com/jobs/b");
    }

    #[tokio::test]
    async fn test_list_filtered_by_status_and_score() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        let a = repo
            .upsert_by_url(&fixtures::new_job("https://example.com/jobs/a"))
            .await
            .unwrap()
            .id();
        let b = repo
            .upsert_by_url(&fixtures::new_job("https://example.com/jobs/b"))
            .await
            .unwrap()
            .id();
        repo.update_score(a, 90, "great").await.unwrap();
        repo.update_score(b, 40, "weak").await.unwrap();
        repo.update_status(a, JobStatus::Reviewed).await.unwrap();

        let filter = JobFilter {
            min_score: Some(70),
            ..Default::default()
        };
        let high = repo.list_filtered(&filter).await.unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, a);

        let filter = JobFilter {
            status: Some(JobStatus::New),
            ..Default::default()
        };
        let fresh = repo.list_filtered(&filter).await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, b);
    }

    #[tokio::test]
    async fn test_list_filtered_orders_unscored_last() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        repo.upsert_by_url(&fixtures::new_job("https://example.com/jobs/unscored"))
            .await
            .unwrap();
        let scored = repo
            .upsert_by_url(&fixtures::new_job("https://example.com/jobs/scored"))
            .await
            .unwrap()
            .id();
        repo.update_score(scored, 55, "ok").await.unwrap();

        let jobs = repo.list_filtered(&JobFilter::default()).await.unwrap();
        assert_eq!(jobs[0].id, scored);
        assert!(jobs[1].match_score.is_none());
    }

    #[tokio::test]
    async fn test_urls_present() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        repo.upsert_by_url(&fixtures::new_job("https://example.com/jobs/a"))
            .await
            .unwrap();

        let present = repo
            .urls_present(&[
                "https://example.com/jobs/a".into(),
                "https://example.com/jobs/b".into(),
            ])
            .await
            .unwrap();
        assert!(present.contains("https://example.com/jobs/a"));
        assert!(!present.contains("https://example.com/jobs/b"));
    }

    #[tokio::test]
    async fn test_aggregate_stats() {
        let pool = fixtures::setup_test_db().await;
        let repo = JobRepository::new(pool);

        let a = repo
            .upsert_by_url(&fixtures::new_job("https://example.com/jobs/a"))
            .await
            .unwrap()
            .id();
        repo.upsert_by_url(&fixtures::new_job("https://example.com/jobs/b"))
            .await
            .unwrap();
        repo.update_score(a, 80, "good").await.unwrap();
        repo.update_status(a, JobStatus::Applied).await.unwrap();

        let stats = repo.aggregate_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unscored, 1);
        assert_eq!(stats.average_score, Some(80.0));
        assert!(stats.by_status.contains(&("applied".to_string(), 1)));
        assert!(stats.by_status.contains(&("new".to_string(), 1)));
    }
}
