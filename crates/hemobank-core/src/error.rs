//! Error types for `hemobank-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::blood::BloodGroup;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("donation not found: {0}")]
  DonationNotFound(Uuid),

  #[error("request not found: {0}")]
  RequestNotFound(Uuid),

  /// A transition was attempted on a record that already left `pending`.
  #[error("donation {id} is not pending (status: {status})")]
  DonationNotPending { id: Uuid, status: String },

  #[error("request {id} is not pending (status: {status})")]
  RequestNotPending { id: Uuid, status: String },

  /// Granting the debit would drive the stock count negative.
  #[error(
    "insufficient {blood_group} stock: {available} units available, \
     {requested} requested"
  )]
  InsufficientStock {
    blood_group: BloodGroup,
    available:   u32,
    requested:   u32,
  },

  #[error("unknown blood group: {0:?}")]
  UnknownBloodGroup(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown urgency: {0:?}")]
  UnknownUrgency(String),

  #[error("unknown log kind: {0:?}")]
  UnknownLogKind(String),

  #[error("unknown stock action: {0:?}")]
  UnknownStockAction(String),

  /// The storage backend failed in a way the caller cannot act on beyond
  /// retrying or reporting.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
