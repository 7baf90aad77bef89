use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::actions::{self, ActionResult};
use crate::routes::json_body;
use crate::state::AppState;
use crate::validation::WordCountReport;

#[derive(Debug, Deserialize)]
pub struct WordCountRequest {
    #[serde(default)]
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/validate/word-count", post(word_count))
}

/// POST /api/validate/word-count: the composer's live length check
async fn word_count(payload: Result<Json<WordCountRequest>, JsonRejection>) -> Response {
    match json_body(payload) {
        Ok(req) => actions::posts::check_word_count(&req.content).into_response(),
        Err(err) => ActionResult::<WordCountReport>::fail(err).into_response(),
    }
}
