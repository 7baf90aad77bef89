use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::actions::{self, ActionResult};
use crate::db::models::{Post, PostWithAuthor};
use crate::extractors::MaybeUser;
use crate::posts::Page;
use crate::routes::{json_body, query_params};
use crate::state::AppState;
use crate::validation::{PostFields, PostPatchFields};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list).post(create))
        .route("/api/posts/draft", post(save_draft))
        .route("/api/posts/publish", post(publish))
        .route("/api/posts/drafts", get(drafts))
        .route("/api/posts/{id}", get(show).patch(update).delete(remove))
}

#[derive(Clone, Copy)]
enum Intent {
    AsSubmitted,
    Draft,
    Publish,
}

async fn create_with(
    state: &AppState,
    user: MaybeUser,
    payload: Result<Json<PostFields>, JsonRejection>,
    intent: Intent,
) -> ActionResult<Post> {
    let fields = match json_body(payload) {
        Ok(fields) => fields,
        Err(err) => return ActionResult::fail(err),
    };
    let user = user.0.as_ref();
    match intent {
        Intent::AsSubmitted => actions::posts::create_post(&state.posts, user, fields).await,
        Intent::Draft => actions::posts::save_post_draft(&state.posts, user, fields).await,
        Intent::Publish => actions::posts::publish_post(&state.posts, user, fields).await,
    }
}

/// GET /api/posts?limit&offset: published feed, newest first
async fn list(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Response {
    let page = match query_params(query) {
        Ok(q) => Page {
            limit: q.limit,
            offset: q.offset,
        },
        Err(err) => return ActionResult::<Vec<PostWithAuthor>>::fail(err).into_response(),
    };
    actions::posts::get_posts(&state.posts, page)
        .await
        .into_response()
}

/// POST /api/posts: create a post; drafts unless `isDraft` is false
async fn create(
    State(state): State<AppState>,
    user: MaybeUser,
    payload: Result<Json<PostFields>, JsonRejection>,
) -> Response {
    create_with(&state, user, payload, Intent::AsSubmitted)
        .await
        .into_response()
}

/// POST /api/posts/draft
async fn save_draft(
    State(state): State<AppState>,
    user: MaybeUser,
    payload: Result<Json<PostFields>, JsonRejection>,
) -> Response {
    create_with(&state, user, payload, Intent::Draft)
        .await
        .into_response()
}

/// POST /api/posts/publish
async fn publish(
    State(state): State<AppState>,
    user: MaybeUser,
    payload: Result<Json<PostFields>, JsonRejection>,
) -> Response {
    create_with(&state, user, payload, Intent::Publish)
        .await
        .into_response()
}

/// GET /api/posts/drafts: the caller's drafts
async fn drafts(State(state): State<AppState>, user: MaybeUser) -> Response {
    actions::posts::get_drafts(&state.posts, user.0.as_ref())
        .await
        .into_response()
}

/// GET /api/posts/{id}
async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    actions::posts::get_post(&state.posts, &id)
        .await
        .into_response()
}

/// PATCH /api/posts/{id}: owner only
async fn update(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
    payload: Result<Json<PostPatchFields>, JsonRejection>,
) -> Response {
    let patch = match json_body(payload) {
        Ok(patch) => patch,
        Err(err) => return ActionResult::<Post>::fail(err).into_response(),
    };
    actions::posts::update_post(&state.posts, user.0.as_ref(), &id, patch)
        .await
        .into_response()
}

/// DELETE /api/posts/{id}: owner only
async fn remove(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> Response {
    actions::posts::delete_post(&state.posts, user.0.as_ref(), &id)
        .await
        .into_response()
}
