//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, UUIDs
//! as hyphenated lowercase strings, and enums as their canonical `as_str`
//! forms (which `FromStr` reverses).

use chrono::{DateTime, NaiveDate, Utc};
use hemobank_core::{
  Error, Result,
  donation::Donation,
  inventory::{BloodStock, InventoryLog},
  request::BloodRequest,
  user::User,
};
use uuid::Uuid;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub blood_group:   String,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub age:           Option<u32>,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      role:          self.role.parse()?,
      blood_group:   self.blood_group.parse()?,
      phone:         self.phone,
      address:       self.address,
      age:           self.age,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `donations` row.
pub struct RawDonation {
  pub donation_id: String,
  pub donor_id:    String,
  pub blood_group: String,
  pub units:       u32,
  pub status:      String,
  pub location:    Option<String>,
  pub created_at:  String,
}

impl RawDonation {
  pub fn into_donation(self) -> Result<Donation> {
    Ok(Donation {
      donation_id: decode_uuid(&self.donation_id)?,
      donor_id:    decode_uuid(&self.donor_id)?,
      blood_group: self.blood_group.parse()?,
      units:       self.units,
      status:      self.status.parse()?,
      location:    self.location,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `requests` row.
pub struct RawRequest {
  pub request_id:   String,
  pub recipient_id: String,
  pub blood_group:  String,
  pub units:        u32,
  pub urgency:      String,
  pub status:       String,
  pub location:     Option<String>,
  pub hospital:     Option<String>,
  pub required_by:  Option<String>,
  pub created_at:   String,
}

impl RawRequest {
  pub fn into_request(self) -> Result<BloodRequest> {
    Ok(BloodRequest {
      request_id:   decode_uuid(&self.request_id)?,
      recipient_id: decode_uuid(&self.recipient_id)?,
      blood_group:  self.blood_group.parse()?,
      units:        self.units,
      urgency:      self.urgency.parse()?,
      status:       self.status.parse()?,
      location:     self.location,
      hospital:     self.hospital,
      required_by:  self.required_by.as_deref().map(decode_date).transpose()?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `blood_stock` row.
pub struct RawStock {
  pub blood_group:  String,
  pub units:        u32,
  pub last_updated: String,
}

impl RawStock {
  pub fn into_stock(self) -> Result<BloodStock> {
    Ok(BloodStock {
      blood_group:  self.blood_group.parse()?,
      units:        self.units,
      last_updated: decode_dt(&self.last_updated)?,
    })
  }
}

/// Raw strings read directly from an `inventory_log` row.
pub struct RawLog {
  pub log_id:           String,
  pub blood_group:      String,
  pub delta:            i64,
  pub kind:             String,
  pub description:      Option<String>,
  pub related_user:     Option<String>,
  pub related_donation: Option<String>,
  pub related_request:  Option<String>,
  pub recorded_at:      String,
}

impl RawLog {
  pub fn into_entry(self) -> Result<InventoryLog> {
    Ok(InventoryLog {
      log_id:           decode_uuid(&self.log_id)?,
      blood_group:      self.blood_group.parse()?,
      delta:            self.delta,
      kind:             self.kind.parse()?,
      description:      self.description,
      related_user:     self
        .related_user
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      related_donation: self
        .related_donation
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      related_request:  self
        .related_request
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}
