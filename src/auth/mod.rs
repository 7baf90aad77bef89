pub mod cookie;
pub mod password;
pub mod service;
pub mod session;

pub use password::PasswordHasher;
pub use service::AuthService;
pub use session::{SessionCodec, SessionIdentity};

/// The acting person for a request, as resolved from its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub person_id: String,
}
