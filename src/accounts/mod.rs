pub mod repository;

pub use repository::{AccountRepository, NewAccount, SqliteAccountRepository};
