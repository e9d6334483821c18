//! Blood requests — the recipient-side mirror of donations.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, blood::BloodGroup};

/// How urgently the requested units are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
  Low,
  #[default]
  Medium,
  High,
}

impl Urgency {
  pub fn as_str(self) -> &'static str {
    match self {
      Urgency::Low => "low",
      Urgency::Medium => "medium",
      Urgency::High => "high",
    }
  }
}

impl fmt::Display for Urgency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Urgency {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low" => Ok(Urgency::Low),
      "medium" => Ok(Urgency::Medium),
      "high" => Ok(Urgency::High),
      other => Err(Error::UnknownUrgency(other.to_string())),
    }
  }
}

/// Lifecycle status of a [`BloodRequest`].
///
/// `Fulfilled` is carried in the schema for delivery tracking but no route
/// currently produces it; like `Approved` and `Rejected` it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Approved,
  Fulfilled,
  Rejected,
}

impl RequestStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      RequestStatus::Pending => "pending",
      RequestStatus::Approved => "approved",
      RequestStatus::Fulfilled => "fulfilled",
      RequestStatus::Rejected => "rejected",
    }
  }

  pub fn is_terminal(self) -> bool {
    !matches!(self, RequestStatus::Pending)
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RequestStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(RequestStatus::Pending),
      "approved" => Ok(RequestStatus::Approved),
      "fulfilled" => Ok(RequestStatus::Fulfilled),
      "rejected" => Ok(RequestStatus::Rejected),
      other => Err(Error::UnknownStatus(other.to_string())),
    }
  }
}

/// A recipient's request for blood units, awaiting admin review.
///
/// Unlike donations, the blood group here is recipient-supplied — a
/// recipient may request any group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodRequest {
  pub request_id:   Uuid,
  pub recipient_id: Uuid,
  pub blood_group:  BloodGroup,
  pub units:        u32,
  pub urgency:      Urgency,
  pub status:       RequestStatus,
  pub location:     Option<String>,
  pub hospital:     Option<String>,
  pub required_by:  Option<NaiveDate>,
  pub created_at:   DateTime<Utc>,
}

/// Input for [`BloodStore::create_request`](crate::store::BloodStore::create_request).
#[derive(Debug, Clone)]
pub struct NewRequest {
  pub recipient_id: Uuid,
  pub blood_group:  BloodGroup,
  pub units:        u32,
  pub urgency:      Urgency,
  pub location:     Option<String>,
  pub hospital:     Option<String>,
  pub required_by:  Option<NaiveDate>,
}
