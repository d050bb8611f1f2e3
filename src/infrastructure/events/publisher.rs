//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::JobState;
use crate::domain::user::MusicService;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 生成任务状态变更
    JobStateChanged {
        job_id: String,
        user_book_id: Uuid,
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 分析完成
    AnalysisReady {
        user_book_id: Uuid,
        analysis_id: Uuid,
        confidence: f64,
    },
    /// 分析失败
    AnalysisFailed {
        user_book_id: Uuid,
        error: String,
    },
    /// 歌单生成完成
    PlaylistReady {
        user_book_id: Uuid,
        playlist_id: Uuid,
        name: String,
        track_count: usize,
        total_duration: u32,
    },
    /// 歌单生成失败
    PlaylistFailed {
        user_book_id: Uuid,
        error: String,
    },
    /// 导出完成
    ExportCompleted {
        playlist_id: Uuid,
        service: String,
        external_playlist_id: String,
        matched: usize,
        unmatched: usize,
    },
    /// 导出失败
    ExportFailed {
        playlist_id: Uuid,
        service: String,
        error: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    /// user_id -> broadcast sender (用户私有事件)
    user_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// 全局广播通道（所有事件的镜像，用于监控端）
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            user_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册用户的事件通道
    pub fn register_user(&self, user_id: &Uuid) -> broadcast::Receiver<WsEvent> {
        let key = user_id.to_string();
        if let Some(sender) = self.user_channels.get(&key) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(100);
        self.user_channels.insert(key, tx);
        rx
    }

    /// 取消注册用户通道
    pub fn unregister_user(&self, user_id: &Uuid) {
        self.user_channels.remove(&user_id.to_string());
    }

    /// 发布任务状态变更事件
    pub fn publish_job_state(
        &self,
        user_id: &Uuid,
        job_id: &str,
        user_book_id: Uuid,
        state: JobState,
    ) {
        self.publish_to_user(
            user_id,
            WsEvent::JobStateChanged {
                job_id: job_id.to_string(),
                user_book_id,
                state: state.as_str().to_string(),
                error: None,
            },
        );
    }

    /// 发布任务失败事件
    pub fn publish_job_failed(
        &self,
        user_id: &Uuid,
        job_id: &str,
        user_book_id: Uuid,
        error: &str,
    ) {
        self.publish_to_user(
            user_id,
            WsEvent::JobStateChanged {
                job_id: job_id.to_string(),
                user_book_id,
                state: JobState::Failed.as_str().to_string(),
                error: Some(error.to_string()),
            },
        );
    }

    /// 发布分析完成事件
    pub fn publish_analysis_ready(
        &self,
        user_id: &Uuid,
        user_book_id: Uuid,
        analysis_id: Uuid,
        confidence: f64,
    ) {
        self.publish_to_user(
            user_id,
            WsEvent::AnalysisReady {
                user_book_id,
                analysis_id,
                confidence,
            },
        );
    }

    /// 发布分析失败事件
    pub fn publish_analysis_failed(&self, user_id: &Uuid, user_book_id: Uuid, error: &str) {
        self.publish_to_user(
            user_id,
            WsEvent::AnalysisFailed {
                user_book_id,
                error: error.to_string(),
            },
        );
    }

    /// 发布歌单完成事件
    pub fn publish_playlist_ready(
        &self,
        user_id: &Uuid,
        user_book_id: Uuid,
        playlist_id: Uuid,
        name: &str,
        track_count: usize,
        total_duration: u32,
    ) {
        self.publish_to_user(
            user_id,
            WsEvent::PlaylistReady {
                user_book_id,
                playlist_id,
                name: name.to_string(),
                track_count,
                total_duration,
            },
        );
    }

    /// 发布歌单失败事件
    pub fn publish_playlist_failed(&self, user_id: &Uuid, user_book_id: Uuid, error: &str) {
        self.publish_to_user(
            user_id,
            WsEvent::PlaylistFailed {
                user_book_id,
                error: error.to_string(),
            },
        );
    }

    /// 发布导出完成事件
    pub fn publish_export_completed(
        &self,
        user_id: &Uuid,
        playlist_id: Uuid,
        service: MusicService,
        external_playlist_id: &str,
        matched: usize,
        unmatched: usize,
    ) {
        self.publish_to_user(
            user_id,
            WsEvent::ExportCompleted {
                playlist_id,
                service: service.as_str().to_string(),
                external_playlist_id: external_playlist_id.to_string(),
                matched,
                unmatched,
            },
        );
    }

    /// 发布导出失败事件
    pub fn publish_export_failed(
        &self,
        user_id: &Uuid,
        playlist_id: Uuid,
        service: MusicService,
        error: &str,
    ) {
        self.publish_to_user(
            user_id,
            WsEvent::ExportFailed {
                playlist_id,
                service: service.as_str().to_string(),
                error: error.to_string(),
            },
        );
    }

    /// 发布事件到指定用户，并镜像到全局通道
    fn publish_to_user(&self, user_id: &Uuid, event: WsEvent) {
        if let Some(sender) = self.user_channels.get(&user_id.to_string()) {
            if let Err(e) = sender.send(event.clone()) {
                tracing::debug!(
                    user_id = %user_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }

        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                user_id = %user_id,
                error = %e,
                "Failed to publish global event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_channel_receives_events() {
        let publisher = EventPublisher::new();
        let user_id = Uuid::new_v4();
        let mut rx = publisher.register_user(&user_id);

        publisher.publish_analysis_ready(&user_id, Uuid::new_v4(), Uuid::new_v4(), 0.8);

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, WsEvent::AnalysisReady { confidence, .. } if confidence == 0.8));
    }

    #[tokio::test]
    async fn test_global_channel_mirrors_user_events() {
        let publisher = EventPublisher::new();
        let user_id = Uuid::new_v4();
        let mut global_rx = publisher.subscribe_global();

        publisher.publish_playlist_failed(&user_id, Uuid::new_v4(), "no candidates");

        let event = global_rx.try_recv().unwrap();
        assert!(matches!(event, WsEvent::PlaylistFailed { .. }));
    }

    #[tokio::test]
    async fn test_other_users_do_not_receive() {
        let publisher = EventPublisher::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let mut rx_b = publisher.register_user(&user_b);

        publisher.publish_analysis_failed(&user_a, Uuid::new_v4(), "boom");

        assert!(rx_b.try_recv().is_err());
    }
}
