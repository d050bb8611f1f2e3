//! Job Queries

/// 查询生成任务状态
#[derive(Debug, Clone)]
pub struct GetJobStatus {
    pub job_id: String,
}
