//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /api/user/register      POST  注册用户
//! - /api/user/get           POST  获取用户详情
//! - /api/user/preferences   POST  更新偏好
//! - /api/user/connect       POST  连接外部服务（存凭据）
//! - /api/user/disconnect    POST  断开外部服务
//! - /api/library/add        POST  加书入架
//! - /api/library/list       POST  列出用户书架
//! - /api/library/get        POST  书架条目详情（含分析与歌单）
//! - /api/library/status     POST  更新阅读状态
//! - /api/library/remove     POST  移出书架
//! - /api/analysis/request   POST  请求分析（同步，幂等）
//! - /api/analysis/get       POST  获取分析
//! - /api/playlist/generate  POST  生成歌单（异步，通过 WS 通知完成）
//! - /api/playlist/list      POST  列出歌单
//! - /api/playlist/get       POST  歌单详情（含曲目）
//! - /api/playlist/activate  POST  激活歌单
//! - /api/playlist/delete    POST  删除歌单
//! - /api/playlist/export    POST  导出到音乐服务（幂等）
//! - /api/job/status         POST  查询生成任务状态
//! - /ws/user/{user_id}      WS    用户事件流
//! - /ws/events              WS    全局事件流

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/user/:user_id", get(handlers::user_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/user", user_routes())
        .nest("/library", library_routes())
        .nest("/analysis", analysis_routes())
        .nest("/playlist", playlist_routes())
        .nest("/job", job_routes())
}

/// User 路由
fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::register_user))
        .route("/get", post(handlers::get_user))
        .route("/preferences", post(handlers::update_preferences))
        .route("/connect", post(handlers::connect_service))
        .route("/disconnect", post(handlers::disconnect_service))
}

/// Library 路由
fn library_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add", post(handlers::add_book))
        .route("/list", post(handlers::list_library))
        .route("/get", post(handlers::get_user_book))
        .route("/status", post(handlers::update_status))
        .route("/remove", post(handlers::remove_book))
}

/// Analysis 路由
fn analysis_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/request", post(handlers::request_analysis))
        .route("/get", post(handlers::get_analysis))
}

/// Playlist 路由
fn playlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::generate_playlist))
        .route("/list", post(handlers::list_playlists))
        .route("/get", post(handlers::get_playlist))
        .route("/activate", post(handlers::activate_playlist))
        .route("/delete", post(handlers::delete_playlist))
        .route("/export", post(handlers::export_playlist))
}

/// Job 路由
fn job_routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", post(handlers::query_job_status))
}
