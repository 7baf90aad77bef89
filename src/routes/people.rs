use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::actions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/people/{username}", get(profile))
        .route("/api/people/{username}/posts", get(posts))
}

/// GET /api/people/{username}
async fn profile(State(state): State<AppState>, Path(username): Path<String>) -> Response {
    actions::people::get_person(state.accounts.as_ref(), &username)
        .await
        .into_response()
}

/// GET /api/people/{username}/posts: published posts only
async fn posts(State(state): State<AppState>, Path(username): Path<String>) -> Response {
    actions::people::get_posts_by_author(state.accounts.as_ref(), &state.posts, &username)
        .await
        .into_response()
}
