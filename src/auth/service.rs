use std::sync::Arc;

use axum::http::HeaderMap;

use crate::accounts::{AccountRepository, NewAccount};
use crate::auth::cookie::{clear_session_cookie, get_cookie_value, session_cookie};
use crate::auth::password::PasswordHasher;
use crate::auth::session::{SessionCodec, SessionIdentity};
use crate::auth::CurrentUser;
use crate::config::AuthConfig;
use crate::db::models::Person;
use crate::db::RepositoryError;
use crate::error::{AppError, AppResult};
use crate::validation::{LoginInput, SignupInput};

pub const USERNAME_TAKEN: &str = "Username already taken";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Signup, login and the session cookie lifecycle.
///
/// Sessions are stateless: the cookie carries a signed identity and nothing is
/// stored server-side, so logout only removes the cookie from the client.
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    hasher: PasswordHasher,
    codec: SessionCodec,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: PasswordHasher,
        codec: SessionCodec,
        config: AuthConfig,
    ) -> Self {
        Self {
            accounts,
            hasher,
            codec,
            config,
        }
    }

    pub async fn signup(&self, input: SignupInput) -> AppResult<Person> {
        let input = input.validate()?;

        // Cheap early exit before paying for bcrypt. The transaction below
        // re-checks, so this isn't what guarantees uniqueness.
        if self.accounts.username_taken(&input.username).await? {
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }

        let hasher = self.hasher;
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

        let new = NewAccount {
            password_hash,
            username: input.username,
            display_name: input.display_name,
            bio: input.bio,
        };
        let (_, person) = self
            .accounts
            .create_with_person(&new)
            .await
            .map_err(|e| match e {
                RepositoryError::UniqueViolation(_) => AppError::Conflict(USERNAME_TAKEN.into()),
                other => other.into(),
            })?;

        tracing::info!(person_id = %person.id, username = %person.username, "Signed up");
        Ok(person)
    }

    pub async fn login(&self, input: LoginInput) -> AppResult<Person> {
        let input = input.validate()?;

        let Some((person, account)) = self.accounts.find_credentials(&input.username).await?
        else {
            tracing::info!("Login failed: unknown username");
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        };

        let hasher = self.hasher;
        let password = input.password;
        let digest = account.password_hash;
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AppError::Internal(format!("verify task failed: {}", e)))?;

        if !valid {
            tracing::info!(person_id = %person.id, "Login failed: wrong password");
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        }

        tracing::info!(person_id = %person.id, "Logged in");
        Ok(person)
    }

    /// The `Set-Cookie` value that starts a session.
    pub fn create_session(&self, person_id: &str, username: &str) -> String {
        let token = self.codec.encode(&SessionIdentity {
            person_id: person_id.to_string(),
            username: username.to_string(),
        });
        session_cookie(&self.config, &token)
    }

    /// The identity in the request's session cookie, if it verifies.
    pub fn get_session(&self, headers: &HeaderMap) -> Option<SessionIdentity> {
        let token = get_cookie_value(headers, &self.config.cookie_name)?;
        self.codec.decode(token)
    }

    /// The `Set-Cookie` value that ends a session.
    pub fn destroy_session(&self) -> String {
        clear_session_cookie(&self.config)
    }

    pub fn get_current_user(&self, headers: &HeaderMap) -> Option<CurrentUser> {
        self.get_session(headers).map(|s| CurrentUser {
            person_id: s.person_id,
        })
    }
}
