use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::CurrentUser;
use crate::state::AppState;

/// The caller's identity, or `None` for anonymous requests.
///
/// Never rejects: a missing, expired or forged cookie is just anonymous.
/// Handlers decide what anonymous callers may do.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(state.auth.get_current_user(&parts.headers)))
    }
}
