//! Recipient-facing routes.

use axum::{
  Form,
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;

use hemobank_core::{
  blood::BloodGroup,
  request::{NewRequest, Urgency},
  store::BloodStore,
  user::Role,
};

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
  authorize(&user, &[Role::Recipient])?;
  let requests = state.store.requests_for_recipient(user.user_id).await?;
  Ok(Html(pages::recipient_dashboard(&user, &requests, None)))
}

pub async fn request_form<S>(
  CurrentUser(user): CurrentUser,
) -> Result<Html<String>, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Recipient])?;
  Ok(Html(pages::request_form(&user, None)))
}

#[derive(Debug, Deserialize)]
pub struct RequestForm {
  pub blood_group: String,
  pub units:       String,
  pub urgency:     Option<String>,
  pub location:    Option<String>,
  pub hospital:    Option<String>,
  pub required_by: Option<String>,
}

pub async fn request<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Form(form): Form<RequestForm>,
) -> Result<Response, Error>
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  authorize(&user, &[Role::Recipient])?;

  let reject = |msg: &str| Html(pages::request_form(&user, Some(msg))).into_response();

  // Recipients may request any group, not just their own.
  let Ok(blood_group) = form.blood_group.parse::<BloodGroup>() else {
    return Ok(reject("Blood group is required"));
  };

  let units = match form.units.trim().parse::<u32>() {
    Ok(units) if units > 0 => units,
    _ => return Ok(reject("Units must be a positive number")),
  };

  let urgency = match none_if_blank(form.urgency) {
    None => Urgency::default(),
    Some(raw) => match raw.parse::<Urgency>() {
      Ok(urgency) => urgency,
      Err(_) => return Ok(reject("Unknown urgency level")),
    },
  };

  let required_by = match none_if_blank(form.required_by) {
    None => None,
    Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
      Ok(date) => Some(date),
      Err(_) => return Ok(reject("Required-by must be a date (YYYY-MM-DD)")),
    },
  };

  let input = NewRequest {
    recipient_id: user.user_id,
    blood_group,
    units,
    urgency,
    location: none_if_blank(form.location),
    hospital: none_if_blank(form.hospital),
    required_by,
  };

  match state.store.create_request(input).await {
    Ok(request) => {
      tracing::info!(
        request = %request.request_id,
        recipient = %user.user_id,
        blood_group = %blood_group,
        units,
        "blood request submitted"
      );
      Ok(Redirect::to("/recipient/dashboard").into_response())
    }
    Err(e) => {
      tracing::error!(error = %e, "request submission failed");
      Ok(reject("Error submitting request"))
    }
  }
}
