//! Data models for the library engine

pub mod book;
pub mod enums;
pub mod member;

// Re-export commonly used types
pub use book::{Book, CreateBook};
pub use enums::Genre;
pub use member::{CreateMember, Member};
