//! Hemobank web application.
//!
//! Exposes an axum [`Router`] serving the donor, recipient, and admin
//! surfaces, backed by any [`hemobank_core::store::BloodStore`]. Sessions
//! are cookie-held signed tokens; see [`auth`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod pages;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use hemobank_core::store::BloodStore;

use auth::TokenSigner;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
///
/// `token_secret` has no default on purpose: the process refuses to start
/// without one rather than signing sessions with a known value.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  pub token_secret: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BloodStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub tokens: Arc<TokenSigner>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Public
    .route("/", get(handlers::session::home))
    .route(
      "/auth/register",
      get(handlers::session::register_form).post(handlers::session::register::<S>),
    )
    .route(
      "/auth/login",
      get(handlers::session::login_form).post(handlers::session::login::<S>),
    )
    .route("/auth/logout", get(handlers::session::logout))
    // Donor
    .route("/donor/dashboard", get(handlers::donor::dashboard::<S>))
    .route("/donor/donation-form", get(handlers::donor::donation_form::<S>))
    .route("/donor/donate", post(handlers::donor::donate::<S>))
    // Recipient
    .route("/recipient/dashboard", get(handlers::recipient::dashboard::<S>))
    .route("/recipient/request-form", get(handlers::recipient::request_form::<S>))
    .route("/recipient/request", post(handlers::recipient::request::<S>))
    // Admin
    .route("/admin/dashboard", get(handlers::admin::dashboard::<S>))
    .route("/admin/manage-inventory", get(handlers::admin::manage_inventory::<S>))
    .route("/admin/update-inventory", post(handlers::admin::update_inventory::<S>))
    .route(
      "/admin/approve-donation/{id}",
      post(handlers::admin::approve_donation::<S>),
    )
    .route(
      "/admin/reject-donation/{id}",
      post(handlers::admin::reject_donation::<S>),
    )
    .route(
      "/admin/approve-request/{id}",
      post(handlers::admin::approve_request::<S>),
    )
    .route(
      "/admin/reject-request/{id}",
      post(handlers::admin::reject_request::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use hemobank_core::{
    blood::BloodGroup,
    donation::NewDonation,
    request::{NewRequest, Urgency},
    user::{NewUser, Role},
  };
  use hemobank_store_sqlite::SqliteStore;

  use crate::auth::hash_password;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:         "127.0.0.1".to_string(),
        port:         3000,
        store_path:   PathBuf::from(":memory:"),
        token_secret: "test-secret".to_string(),
      }),
      tokens: Arc::new(TokenSigner::new("test-secret")),
    }
  }

  async fn add_user(
    state: &AppState<SqliteStore>,
    role: Role,
    email: &str,
    blood_group: BloodGroup,
  ) -> hemobank_core::user::User {
    state
      .store
      .create_user(NewUser {
        name: format!("{role} user"),
        email: email.to_string(),
        password_hash: hash_password("hunter22").unwrap(),
        role,
        blood_group,
        phone: None,
        address: None,
        age: None,
      })
      .await
      .unwrap()
  }

  fn cookie_for(state: &AppState<SqliteStore>, user_id: Uuid) -> String {
    format!("token={}", state.tokens.issue(user_id).unwrap())
  }

  async fn get_with_cookie(
    state: AppState<SqliteStore>,
    uri: &str,
    cookie: Option<&str>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
      builder = builder.header(header::COOKIE, c);
    }
    let req = builder.body(Body::empty()).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn post_form(
    state: AppState<SqliteStore>,
    uri: &str,
    cookie: Option<&str>,
    body: &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
      builder = builder.header(header::COOKIE, c);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  fn location(resp: &axum::response::Response) -> &str {
    resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
  }

  // ── Authentication and roles ───────────────────────────────────────────────

  #[tokio::test]
  async fn protected_page_without_token_redirects_to_login() {
    let state = make_state().await;
    let resp = get_with_cookie(state, "/admin/dashboard", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");
  }

  #[tokio::test]
  async fn garbage_token_redirects_to_login() {
    let state = make_state().await;
    let resp =
      get_with_cookie(state, "/donor/dashboard", Some("token=not.a.jwt")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");
  }

  #[tokio::test]
  async fn donor_cannot_reach_admin_routes() {
    let state = make_state().await;
    let donor = add_user(&state, Role::Donor, "d@example.com", BloodGroup::OPos).await;
    let cookie = cookie_for(&state, donor.user_id);
    let resp =
      get_with_cookie(state, "/admin/dashboard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn register_sets_cookie_and_redirects_to_dashboard() {
    let state = make_state().await;
    let resp = post_form(
      state,
      "/auth/register",
      None,
      "name=Alice&email=alice%40example.com&password=hunter22\
       &role=donor&blood_group=O%2B",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/donor/dashboard");
    let set_cookie =
      resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("token="), "Set-Cookie: {set_cookie}");
    assert!(set_cookie.contains("HttpOnly"));
  }

  #[tokio::test]
  async fn register_refuses_admin_role() {
    let state = make_state().await;
    let resp = post_form(
      state,
      "/auth/register",
      None,
      "name=Eve&email=eve%40example.com&password=hunter22\
       &role=admin&blood_group=O%2B",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("limited to donors and recipients"), "{body}");
  }

  #[tokio::test]
  async fn login_with_wrong_password_stays_generic() {
    let state = make_state().await;
    add_user(&state, Role::Donor, "d@example.com", BloodGroup::APos).await;
    let resp = post_form(
      state,
      "/auth/login",
      None,
      "email=d%40example.com&password=wrong",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Invalid credentials"), "{body}");
  }

  #[tokio::test]
  async fn login_with_unknown_email_stays_generic() {
    let state = make_state().await;
    let resp = post_form(
      state,
      "/auth/login",
      None,
      "email=nobody%40example.com&password=hunter22",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Invalid credentials"), "{body}");
  }

  // ── Donation lifecycle over HTTP ───────────────────────────────────────────

  #[tokio::test]
  async fn donation_submission_and_approval_flow() {
    let state = make_state().await;
    let donor = add_user(&state, Role::Donor, "d@example.com", BloodGroup::OPos).await;
    let admin = add_user(&state, Role::Admin, "a@example.com", BloodGroup::AbPos).await;
    let donor_cookie = cookie_for(&state, donor.user_id);
    let admin_cookie = cookie_for(&state, admin.user_id);

    let resp = post_form(
      state.clone(),
      "/donor/donate",
      Some(&donor_cookie),
      "units=3&location=Clinic",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/donor/dashboard");

    // Submission alone leaves the inventory untouched.
    let stock = state.store.list_stock().await.unwrap();
    assert!(stock.iter().all(|s| s.units == 0));

    let donations = state.store.donations_for_donor(donor.user_id).await.unwrap();
    let id = donations[0].donation_id;

    let resp = post_form(
      state.clone(),
      &format!("/admin/approve-donation/{id}"),
      Some(&admin_cookie),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/admin/dashboard?success="));

    let stock = state.store.list_stock().await.unwrap();
    let o_pos = stock.iter().find(|s| s.blood_group == BloodGroup::OPos).unwrap();
    assert_eq!(o_pos.units, 3);

    // A second approval of the same donation flashes an error.
    let resp = post_form(
      state.clone(),
      &format!("/admin/approve-donation/{id}"),
      Some(&admin_cookie),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      location(&resp),
      "/admin/dashboard?error=Donation+is+not+in+pending+state"
    );
    let stock = state.store.list_stock().await.unwrap();
    let o_pos = stock.iter().find(|s| s.blood_group == BloodGroup::OPos).unwrap();
    assert_eq!(o_pos.units, 3);
  }

  #[tokio::test]
  async fn zero_units_re_renders_the_donation_form() {
    let state = make_state().await;
    let donor = add_user(&state, Role::Donor, "d@example.com", BloodGroup::BNeg).await;
    let cookie = cookie_for(&state, donor.user_id);

    let resp =
      post_form(state.clone(), "/donor/donate", Some(&cookie), "units=0").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Units must be a positive number"), "{body}");
    assert!(
      state.store.donations_for_donor(donor.user_id).await.unwrap().is_empty()
    );
  }

  #[tokio::test]
  async fn approving_missing_donation_flashes_not_found() {
    let state = make_state().await;
    let admin = add_user(&state, Role::Admin, "a@example.com", BloodGroup::AbPos).await;
    let cookie = cookie_for(&state, admin.user_id);

    let resp = post_form(
      state,
      &format!("/admin/approve-donation/{}", Uuid::new_v4()),
      Some(&cookie),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/dashboard?error=Donation+not+found");
  }

  // ── Request lifecycle over HTTP ────────────────────────────────────────────

  #[tokio::test]
  async fn request_approval_fails_on_insufficient_stock() {
    let state = make_state().await;
    let recipient =
      add_user(&state, Role::Recipient, "r@example.com", BloodGroup::ANeg).await;
    let admin = add_user(&state, Role::Admin, "a@example.com", BloodGroup::AbPos).await;
    let recipient_cookie = cookie_for(&state, recipient.user_id);
    let admin_cookie = cookie_for(&state, admin.user_id);

    let resp = post_form(
      state.clone(),
      "/recipient/request",
      Some(&recipient_cookie),
      "blood_group=A-&units=5&urgency=high",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/recipient/dashboard");

    let requests =
      state.store.requests_for_recipient(recipient.user_id).await.unwrap();
    assert_eq!(requests[0].urgency, Urgency::High);
    let id = requests[0].request_id;

    // Only 2 units on hand; the approval must refuse and change nothing.
    state
      .store
      .adjust_stock(hemobank_core::inventory::StockAdjustment {
        blood_group: BloodGroup::ANeg,
        units:       2,
        action:      hemobank_core::inventory::StockAction::Add,
        description: None,
        adjusted_by: Some(admin.user_id),
      })
      .await
      .unwrap();

    let resp = post_form(
      state.clone(),
      &format!("/admin/approve-request/{id}"),
      Some(&admin_cookie),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      location(&resp),
      "/admin/dashboard?error=Insufficient+blood+stock"
    );

    let requests =
      state.store.requests_for_recipient(recipient.user_id).await.unwrap();
    assert_eq!(
      requests[0].status,
      hemobank_core::request::RequestStatus::Pending
    );

    // Restock, then the same approval succeeds and debits.
    state
      .store
      .adjust_stock(hemobank_core::inventory::StockAdjustment {
        blood_group: BloodGroup::ANeg,
        units:       5,
        action:      hemobank_core::inventory::StockAction::Add,
        description: None,
        adjusted_by: Some(admin.user_id),
      })
      .await
      .unwrap();

    let resp = post_form(
      state.clone(),
      &format!("/admin/approve-request/{id}"),
      Some(&admin_cookie),
      "",
    )
    .await;
    assert!(location(&resp).starts_with("/admin/dashboard?success="));
    let stock = state.store.list_stock().await.unwrap();
    let a_neg = stock.iter().find(|s| s.blood_group == BloodGroup::ANeg).unwrap();
    assert_eq!(a_neg.units, 2);
  }

  // ── Manual inventory adjustment over HTTP ──────────────────────────────────

  #[tokio::test]
  async fn update_inventory_add_and_refused_subtract() {
    let state = make_state().await;
    let admin = add_user(&state, Role::Admin, "a@example.com", BloodGroup::AbPos).await;
    let cookie = cookie_for(&state, admin.user_id);

    let resp = post_form(
      state.clone(),
      "/admin/update-inventory",
      Some(&cookie),
      "blood_group=B%2B&units=10&action=add&description=Restock",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      location(&resp),
      "/admin/manage-inventory?success=Inventory+updated+successfully"
    );

    let resp = post_form(
      state.clone(),
      "/admin/update-inventory",
      Some(&cookie),
      "blood_group=B%2B&units=12&action=subtract",
    )
    .await;
    assert_eq!(
      location(&resp),
      "/admin/manage-inventory?error=Insufficient+stock"
    );

    let stock = state.store.list_stock().await.unwrap();
    let b_pos = stock.iter().find(|s| s.blood_group == BloodGroup::BPos).unwrap();
    assert_eq!(b_pos.units, 10);
  }

  #[tokio::test]
  async fn update_inventory_rejects_bad_fields() {
    let state = make_state().await;
    let admin = add_user(&state, Role::Admin, "a@example.com", BloodGroup::AbPos).await;
    let cookie = cookie_for(&state, admin.user_id);

    let resp = post_form(
      state,
      "/admin/update-inventory",
      Some(&cookie),
      "blood_group=X&units=10&action=add",
    )
    .await;
    assert_eq!(
      location(&resp),
      "/admin/manage-inventory?error=Please+provide+all+required+fields"
    );
  }

  // ── Dashboard rendering ────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_dashboard_shows_counts_and_flash() {
    let state = make_state().await;
    let admin = add_user(&state, Role::Admin, "a@example.com", BloodGroup::AbPos).await;
    let donor = add_user(&state, Role::Donor, "d@example.com", BloodGroup::OPos).await;
    add_user(&state, Role::Recipient, "r@example.com", BloodGroup::APos).await;
    state
      .store
      .create_donation(NewDonation {
        donor_id:    donor.user_id,
        blood_group: donor.blood_group,
        units:       2,
        location:    None,
      })
      .await
      .unwrap();
    let cookie = cookie_for(&state, admin.user_id);

    let resp = get_with_cookie(
      state,
      "/admin/dashboard?success=Donation+approved",
      Some(&cookie),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Donors: 1"), "{body}");
    assert!(body.contains("Recipients: 1"), "{body}");
    assert!(body.contains("Pending donations: 1"), "{body}");
    assert!(body.contains("Donation approved"), "{body}");
  }

  #[tokio::test]
  async fn recipient_dashboard_lists_own_requests() {
    let state = make_state().await;
    let recipient =
      add_user(&state, Role::Recipient, "r@example.com", BloodGroup::ONeg).await;
    state
      .store
      .create_request(NewRequest {
        recipient_id: recipient.user_id,
        blood_group:  BloodGroup::ONeg,
        units:        4,
        urgency:      Urgency::Medium,
        location:     None,
        hospital:     Some("General Hospital".to_string()),
        required_by:  None,
      })
      .await
      .unwrap();
    let cookie = cookie_for(&state, recipient.user_id);

    let resp =
      get_with_cookie(state, "/recipient/dashboard", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("O-"), "{body}");
    assert!(body.contains("pending"), "{body}");
  }
}
