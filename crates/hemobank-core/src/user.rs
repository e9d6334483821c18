//! User identity and roles.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, blood::BloodGroup};

/// The role a user acts in. Each role sees its own dashboard and route set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Donor,
  Recipient,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Donor => "donor",
      Role::Recipient => "recipient",
      Role::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "donor" => Ok(Role::Donor),
      "recipient" => Ok(Role::Recipient),
      "admin" => Ok(Role::Admin),
      other => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

/// A registered user. Unique by email; never deleted.
///
/// `password_hash` is an argon2 PHC string — the plaintext password never
/// reaches this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub blood_group:   BloodGroup,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub age:           Option<u32>,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`BloodStore::create_user`](crate::store::BloodStore::create_user).
/// The store assigns the UUID and timestamp.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub blood_group:   BloodGroup,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub age:           Option<u32>,
}
