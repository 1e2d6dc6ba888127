//! Background task registry.
//!
//! Pipelines run as cancellable background work: a task record holds the
//! state enum and progress counters, the pipeline updates it at
//! checkpoints, and pollers read cloned snapshots so a reader never sees a
//! torn multi-field update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    Discovery,
    Scoring,
}

/// Snapshot of one background task, safe to hand to pollers.
#[derive(Debug, Clone, Serialize)]
pub struct TaskProgress {
    pub id: String,
    pub kind: TaskKind,
    pub state: TaskState,
    pub current: usize,
    pub total: usize,
    pub current_item: String,
    pub message: String,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

struct TaskEntry {
    progress: TaskProgress,
    cancel: Arc<AtomicBool>,
}

/// Registry of running and finished tasks, shared between pipelines and
/// whoever polls them.
#[derive(Default)]
pub struct TaskTracker {
    tasks: DashMap<String, TaskEntry>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task and return its id.
    pub fn create(&self, kind: TaskKind) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.tasks.insert(
            id.clone(),
            TaskEntry {
                progress: TaskProgress {
                    id: id.clone(),
                    kind,
                    state: TaskState::NotStarted,
                    current: 0,
                    total: 0,
                    current_item: String::new(),
                    message: "Starting...".to_string(),
                    error: None,
                    started_at: Utc::now(),
                    completed_at: None,
                },
                cancel: Arc::new(AtomicBool::new(false)),
            },
        );
        id
    }

    /// Checkpoint update from a pipeline: counters plus the item currently
    /// being processed.
    pub fn report_progress(&self, task_id: &str, current: usize, total: usize, item: &str) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            entry.progress.state = TaskState::Running;
            entry.progress.current = current;
            entry.progress.total = total;
            entry.progress.current_item = item.to_string();
        }
    }

    pub fn report_done(&self, task_id: &str, result: Result<String, String>) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            match result {
                Ok(message) => {
                    entry.progress.state = TaskState::Completed;
                    entry.progress.message = message;
                }
                Err(error) => {
                    entry.progress.state = TaskState::Failed;
                    entry.progress.error = Some(error);
                }
            }
            entry.progress.completed_at = Some(Utc::now());
        }
    }

    /// Flag a task for cancellation; the pipeline observes the flag at its
    /// next checkpoint. Unknown or finished tasks are ignored.
    pub fn cancel(&self, task_id: &str) {
        if let Some(entry) = self.tasks.get(task_id) {
            log::info!("Cancelling task {}", task_id);
            entry.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// The cancel flag a pipeline polls between items.
    pub fn cancel_flag(&self, task_id: &str) -> Arc<AtomicBool> {
        self.tasks
            .get(task_id)
            .map(|entry| entry.cancel.clone())
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)))
    }

    pub fn get(&self, task_id: &str) -> Option<TaskProgress> {
        self.tasks.get(task_id).map(|entry| entry.progress.clone())
    }

    pub fn all(&self) -> Vec<TaskProgress> {
        self.tasks
            .iter()
            .map(|entry| entry.progress.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_not_started() {
        let tracker = TaskTracker::new();
        let id = tracker.create(TaskKind::Discovery);

        let progress = tracker.get(&id).unwrap();
        assert_eq!(progress.state, TaskState::NotStarted);
        assert_eq!(progress.current, 0);
        assert!(progress.completed_at.is_none());
    }

    #[test]
    fn test_report_progress_moves_to_running() {
        let tracker = TaskTracker::new();
        let id = tracker.create(TaskKind::Discovery);

        tracker.report_progress(&id, 2, 10, "data engineer / Remote");

        let progress = tracker.get(&id).unwrap();
        assert_eq!(progress.state, TaskState::Running);
        assert_eq!(progress.current, 2);
        assert_eq!(progress.total, 10);
        assert_eq!(progress.current_item, "data engineer / Remote");
    }

    #[test]
    fn test_report_done_success_and_failure() {
        let tracker = TaskTracker::new();
        let ok = tracker.create(TaskKind::Scoring);
        let bad = tracker.create(TaskKind::Scoring);

        tracker.report_done(&ok, Ok("Scored 4 jobs".into()));
        tracker.report_done(&bad, Err("resume not found".into()));

        assert_eq!(tracker.get(&ok).unwrap().state, TaskState::Completed);
        assert!(tracker.get(&ok).unwrap().completed_at.is_some());
        let failed = tracker.get(&bad).unwrap();
        assert_eq!(failed.state, TaskState::Failed);
        assert_eq!(failed.error.as_deref(), Some("resume not found"));
    }

    #[test]
    fn test_cancel_flag_is_observable() {
        let tracker = TaskTracker::new();
        let id = tracker.create(TaskKind::Discovery);
        let flag = tracker.cancel_flag(&id);

        assert!(!flag.load(Ordering::Relaxed));
        tracker.cancel(&id);
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_unknown_task_cancel_is_ignored() {
        let tracker = TaskTracker::new();
        tracker.cancel("no-such-task");
        assert!(tracker.get("no-such-task").is_none());
    }
}
