//! Error types and axum `IntoResponse` implementation.
//!
//! Authentication failures never surface detail: a missing, expired, or
//! forged token and an unknown user all collapse into the same redirect to
//! the login page. Role failures render a fixed denial page. Storage
//! failures are logged server-side and shown as a generic error.

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::pages;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not authenticated")]
  Unauthenticated,

  #[error("access denied")]
  Forbidden,

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[from] hemobank_core::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthenticated => Redirect::to("/auth/login").into_response(),
      Error::Forbidden => {
        (StatusCode::FORBIDDEN, Html(pages::access_denied())).into_response()
      }
      Error::Validation(msg) => {
        (StatusCode::BAD_REQUEST, Html(pages::error_page(&msg)))
          .into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Html(pages::error_page("Something went wrong. Please try again later.")),
        )
          .into_response()
      }
    }
  }
}
