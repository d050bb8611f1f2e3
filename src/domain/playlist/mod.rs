//! Playlist Context - 歌单生成上下文

mod aggregate;
mod errors;
mod selection;

pub use aggregate::{Playlist, PlaylistId, Track};
pub use errors::PlaylistError;
pub use selection::{select_tracks, SelectionConfig, TrackCandidate, DEFAULT_TOLERANCE};
