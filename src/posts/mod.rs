pub mod repository;
pub mod service;

pub use repository::{OwnedWrite, Page, PostRepository, SqlitePostRepository};
pub use service::PostService;
