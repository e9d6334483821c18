//! The closed set of ABO/Rh blood groups.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// One of the eight ABO/Rh blood groups.
///
/// The string forms (`"A+"`, `"O-"`, …) are the canonical encoding used in
/// storage, forms, and pages alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
  #[serde(rename = "A+")]
  APos,
  #[serde(rename = "A-")]
  ANeg,
  #[serde(rename = "B+")]
  BPos,
  #[serde(rename = "B-")]
  BNeg,
  #[serde(rename = "AB+")]
  AbPos,
  #[serde(rename = "AB-")]
  AbNeg,
  #[serde(rename = "O+")]
  OPos,
  #[serde(rename = "O-")]
  ONeg,
}

impl BloodGroup {
  /// Every group, in the order stock tables are displayed.
  pub const ALL: [BloodGroup; 8] = [
    BloodGroup::APos,
    BloodGroup::ANeg,
    BloodGroup::BPos,
    BloodGroup::BNeg,
    BloodGroup::AbPos,
    BloodGroup::AbNeg,
    BloodGroup::OPos,
    BloodGroup::ONeg,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      BloodGroup::APos => "A+",
      BloodGroup::ANeg => "A-",
      BloodGroup::BPos => "B+",
      BloodGroup::BNeg => "B-",
      BloodGroup::AbPos => "AB+",
      BloodGroup::AbNeg => "AB-",
      BloodGroup::OPos => "O+",
      BloodGroup::ONeg => "O-",
    }
  }
}

impl fmt::Display for BloodGroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BloodGroup {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "A+" => Ok(BloodGroup::APos),
      "A-" => Ok(BloodGroup::ANeg),
      "B+" => Ok(BloodGroup::BPos),
      "B-" => Ok(BloodGroup::BNeg),
      "AB+" => Ok(BloodGroup::AbPos),
      "AB-" => Ok(BloodGroup::AbNeg),
      "O+" => Ok(BloodGroup::OPos),
      "O-" => Ok(BloodGroup::ONeg),
      other => Err(Error::UnknownBloodGroup(other.to_string())),
    }
  }
}
