//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod analysis_handlers;
mod export_handlers;
mod library_handlers;
mod playlist_handlers;
mod user_handlers;

pub use analysis_handlers::{ensure_analysis, RequestAnalysisHandler};
pub use export_handlers::{ExportPlaylistHandler, ExportResult, ExportRetryConfig};
pub use library_handlers::{
    AddBookToLibraryHandler, AddBookToLibraryResponse, RemoveBookFromLibraryHandler,
    UpdateReadingStatusHandler, UpdateReadingStatusResponse,
};
pub use playlist_handlers::{
    ActivatePlaylistHandler, DeletePlaylistHandler, GeneratePlaylistHandler,
    GeneratePlaylistResponse,
};
pub use user_handlers::{
    ConnectServiceHandler, DisconnectServiceHandler, RegisterUserHandler, RegisterUserResponse,
    UpdatePreferencesHandler,
};
