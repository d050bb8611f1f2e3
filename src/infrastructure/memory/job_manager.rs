//! In-Memory Job Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::ports::{GenerationJob, JobError, JobManagerPort, JobState};

/// 内存任务管理器
pub struct InMemoryJobManager {
    /// job_id -> GenerationJob
    jobs: DashMap<String, GenerationJob>,
    /// user_book_id -> Set<job_id>
    user_book_jobs: DashMap<Uuid, HashSet<String>>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<String>,
}

impl InMemoryJobManager {
    pub fn new(queue_sender: mpsc::Sender<String>) -> Self {
        Self {
            jobs: DashMap::new(),
            user_book_jobs: DashMap::new(),
            queue_sender,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl JobManagerPort for InMemoryJobManager {
    fn submit(&self, job: GenerationJob) -> Result<String, JobError> {
        let job_id = job.job_id.clone();
        let user_book_id = job.user_book_id;

        // 存储任务
        self.jobs.insert(job_id.clone(), job);

        // 关联到书架条目
        self.user_book_jobs
            .entry(user_book_id)
            .or_insert_with(HashSet::new)
            .insert(job_id.clone());

        // 发送到队列
        if let Err(e) = self.queue_sender.try_send(job_id.clone()) {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to enqueue job");
            self.jobs.remove(&job_id);
            if let Some(mut job_ids) = self.user_book_jobs.get_mut(&user_book_id) {
                job_ids.remove(&job_id);
            }
            return Err(JobError::QueueFull);
        }

        tracing::debug!(job_id = %job_id, user_book_id = %user_book_id, "Job submitted");
        Ok(job_id)
    }

    fn cancel_pending(&self, user_book_id: Uuid) -> usize {
        let mut cancelled_count = 0;

        if let Some(job_ids) = self.user_book_jobs.get(&user_book_id) {
            for job_id in job_ids.iter() {
                if let Some(mut job) = self.jobs.get_mut(job_id) {
                    if job.state == JobState::Pending {
                        job.state = JobState::Cancelled;
                        job.completed_at = Some(Utc::now());
                        cancelled_count += 1;
                    }
                }
            }
        }

        tracing::debug!(
            user_book_id = %user_book_id,
            cancelled_count = cancelled_count,
            "Pending jobs cancelled"
        );
        cancelled_count
    }

    fn is_cancelled(&self, job_id: &str) -> bool {
        self.jobs
            .get(job_id)
            .map(|j| j.state == JobState::Cancelled)
            .unwrap_or(true) // 不存在的任务视为已取消
    }

    fn get_state(&self, job_id: &str) -> Option<JobState> {
        self.jobs.get(job_id).map(|j| j.state)
    }

    fn set_state(&self, job_id: &str, state: JobState) -> Result<(), JobError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        let old_state = job.state;
        job.state = state;

        if state.is_terminal() {
            job.completed_at = Some(Utc::now());
        }

        tracing::debug!(
            job_id = %job_id,
            old_state = ?old_state,
            new_state = ?state,
            "Job state changed"
        );
        Ok(())
    }

    fn set_failed(&self, job_id: &str, error: String) -> Result<(), JobError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        job.state = JobState::Failed;
        job.error_message = Some(error);
        job.completed_at = Some(Utc::now());
        Ok(())
    }

    fn set_playlist(&self, job_id: &str, playlist_id: Uuid) -> Result<(), JobError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        job.playlist_id = Some(playlist_id);
        Ok(())
    }

    fn get_job(&self, job_id: &str) -> Option<GenerationJob> {
        self.jobs.get(job_id).map(|j| j.clone())
    }

    fn get_jobs_by_user_book(&self, user_book_id: Uuid) -> Vec<GenerationJob> {
        self.user_book_jobs
            .get(&user_book_id)
            .map(|job_ids| {
                job_ids
                    .iter()
                    .filter_map(|id| self.jobs.get(id).map(|j| j.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let (tx, mut rx) = mpsc::channel(100);
        let manager = InMemoryJobManager::new(tx);

        let job = GenerationJob::new(Uuid::new_v4(), Uuid::new_v4(), false);
        let job_id = job.job_id.clone();

        // Submit
        let submitted_id = manager.submit(job).unwrap();
        assert_eq!(submitted_id, job_id);

        // Check queue
        let queued_id = rx.try_recv().unwrap();
        assert_eq!(queued_id, job_id);

        // Get state
        assert_eq!(manager.get_state(&job_id), Some(JobState::Pending));

        // Set state
        manager.set_state(&job_id, JobState::Analyzing).unwrap();
        assert_eq!(manager.get_state(&job_id), Some(JobState::Analyzing));

        // Terminal state sets completed_at
        manager.set_state(&job_id, JobState::Ready).unwrap();
        let job = manager.get_job(&job_id).unwrap();
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_pending_only() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryJobManager::new(tx);
        let user_book_id = Uuid::new_v4();

        let pending = GenerationJob::new(Uuid::new_v4(), user_book_id, false);
        let pending_id = pending.job_id.clone();
        manager.submit(pending).unwrap();

        let running = GenerationJob::new(Uuid::new_v4(), user_book_id, false);
        let running_id = running.job_id.clone();
        manager.submit(running).unwrap();
        manager.set_state(&running_id, JobState::Analyzing).unwrap();

        let cancelled = manager.cancel_pending(user_book_id);
        assert_eq!(cancelled, 1);
        assert!(manager.is_cancelled(&pending_id));
        assert!(!manager.is_cancelled(&running_id));
    }

    #[tokio::test]
    async fn test_unknown_job_treated_as_cancelled() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryJobManager::new(tx);
        assert!(manager.is_cancelled("no-such-job"));
    }

    #[tokio::test]
    async fn test_set_playlist() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryJobManager::new(tx);

        let job = GenerationJob::new(Uuid::new_v4(), Uuid::new_v4(), false);
        let job_id = manager.submit(job).unwrap();

        let playlist_id = Uuid::new_v4();
        manager.set_playlist(&job_id, playlist_id).unwrap();
        assert_eq!(manager.get_job(&job_id).unwrap().playlist_id, Some(playlist_id));
    }

    #[tokio::test]
    async fn test_queue_full_rejects_submit() {
        let (tx, _rx) = mpsc::channel(1);
        let manager = InMemoryJobManager::new(tx);

        let first = GenerationJob::new(Uuid::new_v4(), Uuid::new_v4(), false);
        manager.submit(first).unwrap();

        let second = GenerationJob::new(Uuid::new_v4(), Uuid::new_v4(), false);
        let second_id = second.job_id.clone();
        assert!(matches!(manager.submit(second), Err(JobError::QueueFull)));
        // 入队失败的任务不残留
        assert!(manager.get_job(&second_id).is_none());
    }
}
