//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod job_handlers;
mod library_handlers;
mod playlist_handlers;
mod user_handlers;

pub use job_handlers::GetJobStatusHandler;
pub use library_handlers::{
    GetAnalysisHandler, GetLibraryHandler, GetUserBookHandler, LibraryEntry, UserBookDetails,
};
pub use playlist_handlers::{GetPlaylistHandler, ListPlaylistsHandler, PlaylistDetails};
pub use user_handlers::{GetUserHandler, UserDetails};
