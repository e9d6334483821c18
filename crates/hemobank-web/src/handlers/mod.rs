//! Route handlers, one module per surface.

pub mod admin;
pub mod donor;
pub mod recipient;
pub mod session;

use axum::response::Redirect;
use serde::Deserialize;

/// Flash message carried between a redirect and the page it lands on, as
/// `?success=` / `?error=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Flash {
  pub success: Option<String>,
  pub error:   Option<String>,
}

/// Redirect to `path` with a flash message attached. Spaces are encoded as
/// `+`, which the query deserializer reverses on arrival.
pub fn flash_redirect(path: &str, key: &str, message: &str) -> Redirect {
  let encoded = message.replace(' ', "+");
  Redirect::to(&format!("{path}?{key}={encoded}"))
}

/// Treat an empty or whitespace-only form field as absent.
pub fn none_if_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}
