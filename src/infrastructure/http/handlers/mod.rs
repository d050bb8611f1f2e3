//! HTTP Handlers

mod analysis;
mod job;
mod library;
mod ping;
mod playlist;
mod user;
mod websocket;

pub use analysis::{get_analysis, request_analysis};
pub use job::query_job_status;
pub use library::{add_book, get_user_book, list_library, remove_book, update_status};
pub use ping::ping;
pub use playlist::{
    activate_playlist, delete_playlist, export_playlist, generate_playlist, get_playlist,
    list_playlists,
};
pub use user::{connect_service, disconnect_service, get_user, register_user, update_preferences};
pub use websocket::{global_websocket_handler, user_websocket_handler};
