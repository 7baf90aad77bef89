//! Request-facing operations.
//!
//! Each action takes already-parsed input plus the caller's identity, runs the
//! services, and folds every outcome into an [`ActionResult`]. Ownership and
//! login checks live here; nothing below this layer sees an anonymous caller.

pub mod auth;
pub mod people;
pub mod posts;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// `{success, data?, error?}`, the one shape every action answers with.
#[derive(Debug, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    pub fn fail(err: AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.public_message()),
            status: err.status(),
        }
    }

    pub fn from_result(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::fail(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ActionResult<()> {
    /// Success with nothing to return.
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// An action result plus a session cookie to set or clear.
pub struct WithCookie<T> {
    pub result: ActionResult<T>,
    pub set_cookie: Option<String>,
}

impl<T: Serialize> IntoResponse for WithCookie<T> {
    fn into_response(self) -> Response {
        let mut response = self.result.into_response();
        if let Some(cookie) = self.set_cookie {
            match cookie.parse::<HeaderValue>() {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!("Unusable Set-Cookie value: {}", e),
            }
        }
        response
    }
}
