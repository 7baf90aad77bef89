use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::actions::{self, ActionResult};
use crate::auth::SessionIdentity;
use crate::routes::json_body;
use crate::state::AppState;
use crate::validation::{LoginInput, SignupInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/api/session", get(session))
}

/// POST /api/auth/signup: create an account and start a session
async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> Response {
    match json_body(payload) {
        Ok(input) => actions::auth::signup(&state.auth, input).await.into_response(),
        Err(err) => ActionResult::<SessionIdentity>::fail(err).into_response(),
    }
}

/// POST /api/auth/login: check credentials and start a session
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Response {
    match json_body(payload) {
        Ok(input) => actions::auth::login(&state.auth, input).await.into_response(),
        Err(err) => ActionResult::<SessionIdentity>::fail(err).into_response(),
    }
}

/// POST /auth/logout: clear the session cookie and send the caller to /login
async fn logout(State(state): State<AppState>) -> Response {
    let outcome = actions::auth::logout(&state.auth);
    let cookie = outcome.set_cookie.unwrap_or_default();
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/login".to_string()),
            (header::SET_COOKIE, cookie),
        ],
        "",
    )
        .into_response()
}

/// GET /api/session: who the cookie says the caller is; `data` is null when anonymous
async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ActionResult<Option<SessionIdentity>> {
    ActionResult::ok(state.auth.get_session(&headers))
}
