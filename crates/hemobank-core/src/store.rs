//! The `BloodStore` trait and supporting view types.
//!
//! The trait is implemented by storage backends (e.g.
//! `hemobank-store-sqlite`). The web layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  blood::BloodGroup,
  donation::{Donation, NewDonation},
  inventory::{BloodStock, InventoryLog, StockAdjustment},
  request::{BloodRequest, NewRequest},
  user::{NewUser, Role, User},
};

// ─── View types ──────────────────────────────────────────────────────────────

/// A pending donation joined with its donor's identity, for admin review.
#[derive(Debug, Clone)]
pub struct PendingDonation {
  pub donation:    Donation,
  pub donor_name:  String,
  pub donor_email: String,
}

/// A pending request joined with its recipient's identity.
#[derive(Debug, Clone)]
pub struct PendingRequest {
  pub request:         BloodRequest,
  pub recipient_name:  String,
  pub recipient_email: String,
}

/// An audit log entry joined with the related user's display name.
#[derive(Debug, Clone)]
pub struct LogView {
  pub entry:     InventoryLog,
  pub user_name: Option<String>,
}

/// Per-blood-group user tally for the admin dashboard.
#[derive(Debug, Clone)]
pub struct GroupCount {
  pub blood_group: BloodGroup,
  pub count:       u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a hemobank storage backend.
///
/// Status transitions (`approve_*`, `reject_*`) must be atomic
/// compare-and-swap operations: concurrent attempts on the same record must
/// resolve to exactly one success, and the stock mutation plus its audit log
/// entry must commit together with the transition or not at all.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded async runtime (tokio with `axum`).
pub trait BloodStore: Send + Sync {
  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, crate::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, crate::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, crate::Error>> + Send + 'a;

  fn count_users_by_role(
    &self,
    role: Role,
  ) -> impl Future<Output = Result<u64, crate::Error>> + Send + '_;

  /// Tally users of `role` per blood group (dashboard breakdown). Groups
  /// with no users are omitted.
  fn count_users_by_group(
    &self,
    role: Role,
  ) -> impl Future<Output = Result<Vec<GroupCount>, crate::Error>> + Send + '_;

  // ── Donations ─────────────────────────────────────────────────────────

  /// Persist a new donation with status `pending`.
  fn create_donation(
    &self,
    input: NewDonation,
  ) -> impl Future<Output = Result<Donation, crate::Error>> + Send + '_;

  /// All donations submitted by one donor, newest first.
  fn donations_for_donor(
    &self,
    donor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Donation>, crate::Error>> + Send + '_;

  /// Pending donations joined with donor identity, newest first.
  fn pending_donations(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<PendingDonation>, crate::Error>> + Send + '_;

  fn count_pending_donations(
    &self,
  ) -> impl Future<Output = Result<u64, crate::Error>> + Send + '_;

  /// Approve a pending donation: transition `pending → approved`, credit
  /// the donation's blood group by its units, and append one `donation`
  /// audit entry — all in one atomic unit. Returns the stock row after the
  /// credit.
  ///
  /// Fails with `DonationNotFound` or `DonationNotPending`; on failure
  /// nothing is mutated.
  fn approve_donation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<BloodStock, crate::Error>> + Send + '_;

  /// Reject a pending donation. No inventory effect.
  fn reject_donation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), crate::Error>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  fn create_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<BloodRequest, crate::Error>> + Send + '_;

  fn requests_for_recipient(
    &self,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BloodRequest>, crate::Error>> + Send + '_;

  fn pending_requests(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<PendingRequest>, crate::Error>> + Send + '_;

  fn count_pending_requests(
    &self,
  ) -> impl Future<Output = Result<u64, crate::Error>> + Send + '_;

  /// Approve a pending request: verify sufficient stock, debit it, append
  /// one `request` audit entry with a negative delta, and transition
  /// `pending → approved` — all in one atomic unit. Returns the stock row
  /// after the debit.
  ///
  /// Fails with `RequestNotFound`, `RequestNotPending`, or
  /// `InsufficientStock`; on failure nothing is mutated.
  fn approve_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<BloodStock, crate::Error>> + Send + '_;

  /// Reject a pending request. No inventory effect.
  fn reject_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), crate::Error>> + Send + '_;

  // ── Inventory ─────────────────────────────────────────────────────────

  /// Current stock for every blood group, in [`BloodGroup::ALL`] order.
  /// Groups with no stored row are reported with zero units.
  fn list_stock(
    &self,
  ) -> impl Future<Output = Result<Vec<BloodStock>, crate::Error>> + Send + '_;

  /// Apply a manual adjustment (add / subtract / set) and append one
  /// `adjustment` audit entry, atomically. `subtract` fails with
  /// `InsufficientStock` rather than underflow.
  fn adjust_stock(
    &self,
    input: StockAdjustment,
  ) -> impl Future<Output = Result<BloodStock, crate::Error>> + Send + '_;

  /// Most recent audit entries, newest first, joined with user names.
  fn recent_logs(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<LogView>, crate::Error>> + Send + '_;
}
