//! Donation records and their lifecycle.
//!
//! A donation is created `pending` and transitions exactly once, to either
//! `approved` or `rejected`. Both are terminal; a record that has left
//! `pending` is never mutated again. Inventory is only credited at the
//! moment of approval, never at submission.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, blood::BloodGroup};

/// Lifecycle status of a [`Donation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
  Pending,
  Approved,
  Rejected,
}

impl DonationStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      DonationStatus::Pending => "pending",
      DonationStatus::Approved => "approved",
      DonationStatus::Rejected => "rejected",
    }
  }

  /// Terminal statuses never change again.
  pub fn is_terminal(self) -> bool {
    !matches!(self, DonationStatus::Pending)
  }
}

impl fmt::Display for DonationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DonationStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(DonationStatus::Pending),
      "approved" => Ok(DonationStatus::Approved),
      "rejected" => Ok(DonationStatus::Rejected),
      other => Err(Error::UnknownStatus(other.to_string())),
    }
  }
}

/// A donor's offer of whole-blood units, awaiting admin review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
  pub donation_id: Uuid,
  pub donor_id:    Uuid,
  /// Copied from the donor's profile at submission time — never taken from
  /// the form, so a donor cannot credit a group other than their own.
  pub blood_group: BloodGroup,
  pub units:       u32,
  pub status:      DonationStatus,
  pub location:    Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input for [`BloodStore::create_donation`](crate::store::BloodStore::create_donation).
/// The persisted record always starts `pending`.
#[derive(Debug, Clone)]
pub struct NewDonation {
  pub donor_id:    Uuid,
  pub blood_group: BloodGroup,
  pub units:       u32,
  pub location:    Option<String>,
}
