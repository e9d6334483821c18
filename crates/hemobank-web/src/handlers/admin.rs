//! Admin routes: review queue, approvals, and manual inventory control.
//!
//! Approval handlers lean entirely on the store's atomic transitions; a
//! concurrent double-approve resolves here as one success flash and one
//! "not in pending state" error flash.

use axum::{
  Form,
  extract::{Path, Query, State},
  response::{Html, Redirect},
};
use serde::Deserialize;
use uuid::Uuid;

use hemobank_core::{
  blood::BloodGroup,
  inventory::{StockAction, StockAdjustment},
  store::{BloodStore, GroupCount},
  user::Role,
};

use crate::{
  AppState,
  auth::{CurrentUser, authorize},
  error::Error,
  handlers::{Flash, flash_redirect, none_if_blank},
  pages,
};

/// How many pending items the dashboard shows per queue.
const DASHBOARD_QUEUE_LIMIT: u32 = 5;
/// How many audit entries the inventory page shows.
const LOG_LIMIT: u32 = 10;

/// Aggregate counts shown at the top of the admin dashboard.
pub struct DashboardStats {
  pub donors:              u64,
  pub recipients:          u64,
  pub pending_donations:   u64,
  pub pending_requests:    u64,
  pub donors_by_group:     Vec<GroupCount>,
  pub recipients_by_group: Vec<GroupCount>,
}

// ─── Pages ───────────────────────────────────────────────────────────────────

pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(flash): Query<Flash>,
) -> Result<Html<String>, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  let stats = DashboardStats {
    donors:              state.store.count_users_by_role(Role::Donor).await?,
    recipients:          state.store.count_users_by_role(Role::Recipient).await?,
    pending_donations:   state.store.count_pending_donations().await?,
    pending_requests:    state.store.count_pending_requests().await?,
    donors_by_group:     state.store.count_users_by_group(Role::Donor).await?,
    recipients_by_group: state.store.count_users_by_group(Role::Recipient).await?,
  };
  let donations = state.store.pending_donations(DASHBOARD_QUEUE_LIMIT).await?;
  let requests = state.store.pending_requests(DASHBOARD_QUEUE_LIMIT).await?;

  Ok(Html(pages::admin_dashboard(
    &user,
    &stats,
    &donations,
    &requests,
    flash.success.as_deref(),
    flash.error.as_deref(),
  )))
}

pub async fn manage_inventory<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(flash): Query<Flash>,
) -> Result<Html<String>, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  let stock = state.store.list_stock().await?;
  let logs = state.store.recent_logs(LOG_LIMIT).await?;

  Ok(Html(pages::manage_inventory(
    &user,
    &stock,
    &logs,
    flash.success.as_deref(),
    flash.error.as_deref(),
  )))
}

// ─── Manual adjustment ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryForm {
  pub blood_group: String,
  pub units:       String,
  pub action:      String,
  pub description: Option<String>,
}

pub async fn update_inventory<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Form(form): Form<UpdateInventoryForm>,
) -> Result<Redirect, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  let reject =
    |msg: &str| Ok(flash_redirect("/admin/manage-inventory", "error", msg));

  let (Ok(blood_group), Ok(action)) = (
    form.blood_group.parse::<BloodGroup>(),
    form.action.parse::<StockAction>(),
  ) else {
    return reject("Please provide all required fields");
  };
  let Ok(units) = form.units.trim().parse::<u32>() else {
    return reject("Please provide all required fields");
  };

  let adjustment = StockAdjustment {
    blood_group,
    units,
    action,
    description: none_if_blank(form.description),
    adjusted_by: Some(user.user_id),
  };

  match state.store.adjust_stock(adjustment).await {
    Ok(stock) => {
      tracing::info!(
        blood_group = %blood_group,
        action = %action,
        units,
        total = stock.units,
        admin = %user.user_id,
        "inventory adjusted"
      );
      Ok(flash_redirect(
        "/admin/manage-inventory",
        "success",
        "Inventory updated successfully",
      ))
    }
    Err(hemobank_core::Error::InsufficientStock { .. }) => {
      reject("Insufficient stock")
    }
    Err(e) => {
      tracing::error!(error = %e, "inventory adjustment failed");
      reject("Failed to update inventory")
    }
  }
}

// ─── Donation review ─────────────────────────────────────────────────────────

pub async fn approve_donation<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Redirect, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  match state.store.approve_donation(id).await {
    Ok(stock) => {
      tracing::info!(
        donation = %id,
        blood_group = %stock.blood_group,
        total = stock.units,
        admin = %user.user_id,
        "donation approved"
      );
      Ok(flash_redirect("/admin/dashboard", "success", "Donation approved"))
    }
    Err(hemobank_core::Error::DonationNotFound(_)) => {
      Ok(flash_redirect("/admin/dashboard", "error", "Donation not found"))
    }
    Err(hemobank_core::Error::DonationNotPending { .. }) => Ok(flash_redirect(
      "/admin/dashboard",
      "error",
      "Donation is not in pending state",
    )),
    Err(e) => Err(Error::Store(e)),
  }
}

pub async fn reject_donation<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Redirect, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  match state.store.reject_donation(id).await {
    Ok(()) => {
      tracing::info!(donation = %id, admin = %user.user_id, "donation rejected");
      Ok(flash_redirect("/admin/dashboard", "success", "Donation rejected"))
    }
    Err(hemobank_core::Error::DonationNotFound(_)) => {
      Ok(flash_redirect("/admin/dashboard", "error", "Donation not found"))
    }
    Err(hemobank_core::Error::DonationNotPending { .. }) => Ok(flash_redirect(
      "/admin/dashboard",
      "error",
      "Donation is not in pending state",
    )),
    Err(e) => Err(Error::Store(e)),
  }
}

// ─── Request review ──────────────────────────────────────────────────────────

pub async fn approve_request<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Redirect, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  match state.store.approve_request(id).await {
    Ok(stock) => {
      tracing::info!(
        request = %id,
        blood_group = %stock.blood_group,
        total = stock.units,
        admin = %user.user_id,
        "request approved"
      );
      Ok(flash_redirect("/admin/dashboard", "success", "Request approved"))
    }
    Err(hemobank_core::Error::RequestNotFound(_)) => {
      Ok(flash_redirect("/admin/dashboard", "error", "Request not found"))
    }
    Err(hemobank_core::Error::RequestNotPending { .. }) => Ok(flash_redirect(
      "/admin/dashboard",
      "error",
      "Request is not in pending state",
    )),
    Err(hemobank_core::Error::InsufficientStock { .. }) => {
      Ok(flash_redirect("/admin/dashboard", "error", "Insufficient blood stock"))
    }
    Err(e) => Err(Error::Store(e)),
  }
}

pub async fn reject_request<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Redirect, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Admin])?;

  match state.store.reject_request(id).await {
    Ok(()) => {
      tracing::info!(request = %id, admin = %user.user_id, "request rejected");
      Ok(flash_redirect("/admin/dashboard", "success", "Request rejected"))
    }
    Err(hemobank_core::Error::RequestNotFound(_)) => {
      Ok(flash_redirect("/admin/dashboard", "error", "Request not found"))
    }
    Err(hemobank_core::Error::RequestNotPending { .. }) => Ok(flash_redirect(
      "/admin/dashboard",
      "error",
      "Request is not in pending state",
    )),
    Err(e) => Err(Error::Store(e)),
  }
}
