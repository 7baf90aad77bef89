use std::sync::Arc;

use chrono::Duration;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::accounts::{AccountRepository, SqliteAccountRepository};
use crate::auth::{AuthService, PasswordHasher, SessionCodec};
use crate::config::Config;
use crate::posts::{PostService, SqlitePostRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountRepository>,
    pub auth: Arc<AuthService>,
    pub posts: PostService,
}

impl AppState {
    /// Wires the services over `db`. Fails without a usable session secret or
    /// with out-of-range auth settings.
    pub fn new(config: Config, db: DbPool) -> anyhow::Result<Self> {
        config.auth.check()?;
        let ttl = Duration::days(config.auth.session_days as i64);
        let codec = SessionCodec::new(config.session_secret()?, ttl)?;

        let accounts: Arc<dyn AccountRepository> =
            Arc::new(SqliteAccountRepository::new(db.clone()));
        let auth = AuthService::new(
            accounts.clone(),
            PasswordHasher::new(config.auth.bcrypt_cost),
            codec,
            config.auth.clone(),
        );
        let posts = PostService::new(Arc::new(SqlitePostRepository::new(db)));

        Ok(Self {
            config,
            accounts,
            auth: Arc::new(auth),
            posts,
        })
    }
}
