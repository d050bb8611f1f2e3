//! Book Context - 书籍元数据上下文

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Book;
pub use errors::BookError;
pub use value_objects::{BookId, BookSource, BookTitle};
