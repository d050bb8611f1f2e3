//! Library Context - 用户书架上下文

mod aggregate;
mod errors;

pub use aggregate::{ReadingStatus, UserBook, UserBookId};
pub use errors::LibraryError;
