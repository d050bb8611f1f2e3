//! Worker - 后台任务处理

mod generation_worker;

pub use generation_worker::{GenerationWorker, GenerationWorkerConfig, WorkerContext};
