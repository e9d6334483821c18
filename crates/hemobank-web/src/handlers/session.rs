//! Registration, login, and logout.

use axum::{
  Form,
  extract::State,
  http::header,
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use hemobank_core::{
  blood::BloodGroup,
  store::BloodStore,
  user::{NewUser, Role},
};

use crate::{
  AppState,
  auth::{clear_cookie, hash_password, session_cookie, verify_password},
  error::Error,
  handlers::none_if_blank,
  pages,
};

fn dashboard_path(role: Role) -> &'static str {
  match role {
    Role::Donor => "/donor/dashboard",
    Role::Recipient => "/recipient/dashboard",
    Role::Admin => "/admin/dashboard",
  }
}

pub async fn home() -> Html<String> {
  Html(pages::home())
}

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
  pub name:        String,
  pub email:       String,
  pub password:    String,
  pub role:        String,
  pub blood_group: String,
  pub phone:       Option<String>,
  pub address:     Option<String>,
  pub age:         Option<String>,
}

pub async fn register_form() -> Html<String> {
  Html(pages::register_form(None))
}

pub async fn register<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<RegisterForm>,
) -> Result<Response, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  let reject = |msg: &str| Html(pages::register_form(Some(msg))).into_response();

  if form.name.trim().is_empty() {
    return Ok(reject("Name is required"));
  }
  if !form.email.contains('@') {
    return Ok(reject("Valid email is required"));
  }
  if form.password.len() < 6 {
    return Ok(reject("Password must be at least 6 characters"));
  }

  // Self-service registration only grants donor or recipient; admin
  // accounts are provisioned out of band.
  let role = match form.role.parse::<Role>() {
    Ok(role @ (Role::Donor | Role::Recipient)) => role,
    _ => return Ok(reject("Registration is limited to donors and recipients")),
  };

  let Ok(blood_group) = form.blood_group.parse::<BloodGroup>() else {
    return Ok(reject("Blood group is required"));
  };

  let age = match none_if_blank(form.age) {
    None => None,
    Some(raw) => match raw.trim().parse::<u32>() {
      Ok(age) => Some(age),
      Err(_) => return Ok(reject("Age must be a number")),
    },
  };

  let password_hash = hash_password(&form.password)?;
  let user = match state
    .store
    .create_user(NewUser {
      name: form.name.trim().to_string(),
      email: form.email.trim().to_lowercase(),
      password_hash,
      role,
      blood_group,
      phone: none_if_blank(form.phone),
      address: none_if_blank(form.address),
      age,
    })
    .await
  {
    Ok(user) => user,
    Err(hemobank_core::Error::EmailTaken(_)) => {
      return Ok(reject("User already exists"));
    }
    Err(e) => {
      tracing::error!(error = %e, "registration failed");
      return Ok(reject("Server error"));
    }
  };

  tracing::info!(user = %user.user_id, role = %user.role, "user registered");

  let token = state.tokens.issue(user.user_id)?;
  Ok(
    (
      [(header::SET_COOKIE, session_cookie(&token))],
      Redirect::to(dashboard_path(user.role)),
    )
      .into_response(),
  )
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  pub email:    String,
  pub password: String,
}

pub async fn login_form() -> Html<String> {
  Html(pages::login_form(None))
}

pub async fn login<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<LoginForm>,
) -> Result<Response, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  let user = state
    .store
    .find_user_by_email(form.email.trim().to_lowercase().as_str())
    .await?;

  // One generic message for both unknown email and wrong password.
  let Some(user) = user.filter(|u| verify_password(&form.password, &u.password_hash))
  else {
    return Ok(Html(pages::login_form(Some("Invalid credentials"))).into_response());
  };

  let token = state.tokens.issue(user.user_id)?;
  Ok(
    (
      [(header::SET_COOKIE, session_cookie(&token))],
      Redirect::to(dashboard_path(user.role)),
    )
      .into_response(),
  )
}

pub async fn logout() -> Response {
  ([(header::SET_COOKIE, clear_cookie())], Redirect::to("/")).into_response()
}
