//! Donor-facing routes.

use axum::{
  Form,
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use hemobank_core::{donation::NewDonation, store::BloodStore, user::Role};

use crate::{
  AppState,
  auth::{CurrentUser, authorize},
  error::Error,
  handlers::none_if_blank,
  pages,
};

pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Html<String>, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Donor])?;
  let donations = state.store.donations_for_donor(user.user_id).await?;
  Ok(Html(pages::donor_dashboard(&user, &donations, None)))
}

pub async fn donation_form<S>(
  CurrentUser(user): CurrentUser,
) -> Result<Html<String>, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Donor])?;
  Ok(Html(pages::donation_form(&user, None)))
}

#[derive(Debug, Deserialize)]
pub struct DonateForm {
  pub units:    String,
  pub location: Option<String>,
}

pub async fn donate<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Form(form): Form<DonateForm>,
) -> Result<Response, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Donor])?;

  let units = match form.units.trim().parse::<u32>() {
    Ok(units) if units > 0 => units,
    _ => {
      return Ok(
        Html(pages::donation_form(&user, Some("Units must be a positive number")))
          .into_response(),
      );
    }
  };

  // The blood group comes from the donor's profile, never from the form.
  let input = NewDonation {
    donor_id:    user.user_id,
    blood_group: user.blood_group,
    units,
    location:    none_if_blank(form.location),
  };

  match state.store.create_donation(input).await {
    Ok(donation) => {
      tracing::info!(
        donation = %donation.donation_id,
        donor = %user.user_id,
        units,
        "donation submitted"
      );
      Ok(Redirect::to("/donor/dashboard").into_response())
    }
    Err(e) => {
      tracing::error!(error = %e, "donation submission failed");
      Ok(
        Html(pages::donation_form(&user, Some("Error submitting donation")))
          .into_response(),
      )
    }
  }
}
