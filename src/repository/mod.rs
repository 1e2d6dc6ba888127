pub mod job_repository;

pub use job_repository::JobRepository;

use crate::domain::models::JobStatus;

/// Map a stored status string back to the enum. Unknown values fall back
/// to `new` rather than failing the whole row.
pub(crate) fn map_job_status(raw: &str) -> JobStatus {
    raw.parse::<JobStatus>().unwrap_or_else(|_| {
        log::warn!("Unknown job status '{}' in store, treating as new", raw);
        JobStatus::New
    })
}
