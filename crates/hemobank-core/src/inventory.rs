//! Stock levels and the append-only inventory audit log.
//!
//! `BloodStock` rows are the only mutable inventory state; every change to
//! them — donation approval, request approval, manual adjustment — appends
//! one [`InventoryLog`] entry in the same transaction. Log entries are never
//! updated or deleted.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, blood::BloodGroup};

// ─── Stock ───────────────────────────────────────────────────────────────────

/// Current on-hand units for one blood group.
///
/// Invariant: `units` is never negative. The type makes underflow
/// unrepresentable; the store additionally refuses any mutation that would
/// need to borrow below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodStock {
  pub blood_group:  BloodGroup,
  pub units:        u32,
  pub last_updated: DateTime<Utc>,
}

impl BloodStock {
  /// A zero-unit placeholder for groups with no stored row yet.
  pub fn empty(blood_group: BloodGroup) -> Self {
    Self { blood_group, units: 0, last_updated: Utc::now() }
  }
}

// ─── Manual adjustment ───────────────────────────────────────────────────────

/// What a manual inventory adjustment does to the current unit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAction {
  Add,
  Subtract,
  /// Administrative override: replaces the count outright, so it is exempt
  /// from the subtract-side sufficiency check.
  Set,
}

impl StockAction {
  pub fn as_str(self) -> &'static str {
    match self {
      StockAction::Add => "add",
      StockAction::Subtract => "subtract",
      StockAction::Set => "set",
    }
  }
}

impl fmt::Display for StockAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StockAction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "add" => Ok(StockAction::Add),
      "subtract" => Ok(StockAction::Subtract),
      "set" => Ok(StockAction::Set),
      other => Err(Error::UnknownStockAction(other.to_string())),
    }
  }
}

/// Input for [`BloodStore::adjust_stock`](crate::store::BloodStore::adjust_stock).
#[derive(Debug, Clone)]
pub struct StockAdjustment {
  pub blood_group: BloodGroup,
  pub units:       u32,
  pub action:      StockAction,
  pub description: Option<String>,
  /// The admin who made the adjustment, for the audit trail.
  pub adjusted_by: Option<Uuid>,
}

// ─── Audit log ───────────────────────────────────────────────────────────────

/// What caused an inventory log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
  Donation,
  Request,
  Adjustment,
}

impl LogKind {
  pub fn as_str(self) -> &'static str {
    match self {
      LogKind::Donation => "donation",
      LogKind::Request => "request",
      LogKind::Adjustment => "adjustment",
    }
  }
}

impl fmt::Display for LogKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LogKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "donation" => Ok(LogKind::Donation),
      "request" => Ok(LogKind::Request),
      "adjustment" => Ok(LogKind::Adjustment),
      other => Err(Error::UnknownLogKind(other.to_string())),
    }
  }
}

/// One append-only audit entry recording a signed stock delta.
///
/// `related_donation` and `related_request` are mutually exclusive: a
/// `donation` entry references the donation, a `request` entry the request,
/// an `adjustment` entry neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLog {
  pub log_id:           Uuid,
  pub blood_group:      BloodGroup,
  /// Signed change in units: positive for credits, negative for debits. A
  /// `set` adjustment records `new − old`.
  pub delta:            i64,
  pub kind:             LogKind,
  pub description:      Option<String>,
  pub related_user:     Option<Uuid>,
  pub related_donation: Option<Uuid>,
  pub related_request:  Option<Uuid>,
  pub recorded_at:      DateTime<Utc>,
}
