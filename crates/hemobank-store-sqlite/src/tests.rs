//! Integration tests for `SqliteStore` against an in-memory database.

use hemobank_core::{
  Error,
  blood::BloodGroup,
  donation::{DonationStatus, NewDonation},
  inventory::{LogKind, StockAction, StockAdjustment},
  request::{NewRequest, RequestStatus, Urgency},
  store::BloodStore,
  user::{NewUser, Role, User},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn add_user(s: &SqliteStore, role: Role, email: &str, group: BloodGroup) -> User {
  s.create_user(NewUser {
    name:          format!("{role} {email}"),
    email:         email.to_string(),
    password_hash: "$argon2id$test".to_string(),
    role,
    blood_group:   group,
    phone:         None,
    address:       None,
    age:           None,
  })
  .await
  .unwrap()
}

fn donation(donor: &User, units: u32) -> NewDonation {
  NewDonation {
    donor_id:    donor.user_id,
    blood_group: donor.blood_group,
    units,
    location:    Some("City clinic".into()),
  }
}

fn request(recipient: &User, group: BloodGroup, units: u32) -> NewRequest {
  NewRequest {
    recipient_id: recipient.user_id,
    blood_group:  group,
    units,
    urgency:      Urgency::High,
    location:     Some("General hospital".into()),
    hospital:     Some("General".into()),
    required_by:  None,
  }
}

async fn stock_units(s: &SqliteStore, group: BloodGroup) -> u32 {
  s.list_stock()
    .await
    .unwrap()
    .into_iter()
    .find(|row| row.blood_group == group)
    .unwrap()
    .units
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_user() {
  let s = store().await;
  let u = add_user(&s, Role::Donor, "alice@example.com", BloodGroup::APos).await;

  let by_id = s.get_user(u.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.email, "alice@example.com");
  assert_eq!(by_id.role, Role::Donor);
  assert_eq!(by_id.blood_group, BloodGroup::APos);

  let by_email = s
    .find_user_by_email("alice@example.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_email.user_id, u.user_id);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  add_user(&s, Role::Donor, "dup@example.com", BloodGroup::OPos).await;

  let err = s
    .create_user(NewUser {
      name:          "Second".into(),
      email:         "dup@example.com".into(),
      password_hash: "$argon2id$test".into(),
      role:          Role::Recipient,
      blood_group:   BloodGroup::ANeg,
      phone:         None,
      address:       None,
      age:           None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmailTaken(_)));
}

#[tokio::test]
async fn user_counts_by_role_and_group() {
  let s = store().await;
  add_user(&s, Role::Donor, "d1@example.com", BloodGroup::OPos).await;
  add_user(&s, Role::Donor, "d2@example.com", BloodGroup::OPos).await;
  add_user(&s, Role::Donor, "d3@example.com", BloodGroup::ANeg).await;
  add_user(&s, Role::Recipient, "r1@example.com", BloodGroup::BPos).await;

  assert_eq!(s.count_users_by_role(Role::Donor).await.unwrap(), 3);
  assert_eq!(s.count_users_by_role(Role::Recipient).await.unwrap(), 1);
  assert_eq!(s.count_users_by_role(Role::Admin).await.unwrap(), 0);

  let groups = s.count_users_by_group(Role::Donor).await.unwrap();
  let o_pos = groups
    .iter()
    .find(|g| g.blood_group == BloodGroup::OPos)
    .unwrap();
  assert_eq!(o_pos.count, 2);
}

// ─── Donation lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn submission_does_not_touch_stock() {
  let s = store().await;
  let donor = add_user(&s, Role::Donor, "d@example.com", BloodGroup::OPos).await;

  s.create_donation(donation(&donor, 3)).await.unwrap();

  assert_eq!(stock_units(&s, BloodGroup::OPos).await, 0);
  assert!(s.recent_logs(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn approval_credits_stock_and_logs_once() {
  // BloodStock[O+] = 0; approve a 3-unit O+ donation → stock 3, one
  // donation-kind log entry with delta +3.
  let s = store().await;
  let donor = add_user(&s, Role::Donor, "d@example.com", BloodGroup::OPos).await;
  let d = s.create_donation(donation(&donor, 3)).await.unwrap();

  let stock = s.approve_donation(d.donation_id).await.unwrap();
  assert_eq!(stock.blood_group, BloodGroup::OPos);
  assert_eq!(stock.units, 3);

  let logs = s.recent_logs(10).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].entry.kind, LogKind::Donation);
  assert_eq!(logs[0].entry.delta, 3);
  assert_eq!(logs[0].entry.related_donation, Some(d.donation_id));
  assert_eq!(logs[0].entry.related_user, Some(donor.user_id));

  let refreshed = s.donations_for_donor(donor.user_id).await.unwrap();
  assert_eq!(refreshed[0].status, DonationStatus::Approved);
}

#[tokio::test]
async fn second_approval_is_a_rejected_noop() {
  let s = store().await;
  let donor = add_user(&s, Role::Donor, "d@example.com", BloodGroup::OPos).await;
  let d = s.create_donation(donation(&donor, 3)).await.unwrap();

  s.approve_donation(d.donation_id).await.unwrap();
  let err = s.approve_donation(d.donation_id).await.unwrap_err();
  assert!(matches!(err, Error::DonationNotPending { .. }));

  // No double credit, no second log entry.
  assert_eq!(stock_units(&s, BloodGroup::OPos).await, 3);
  assert_eq!(s.recent_logs(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn approving_missing_donation_fails() {
  let s = store().await;
  let err = s.approve_donation(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::DonationNotFound(_)));
}

#[tokio::test]
async fn rejection_is_terminal_and_leaves_inventory_alone() {
  let s = store().await;
  let donor = add_user(&s, Role::Donor, "d@example.com", BloodGroup::AbNeg).await;
  let d = s.create_donation(donation(&donor, 2)).await.unwrap();

  s.reject_donation(d.donation_id).await.unwrap();
  assert_eq!(stock_units(&s, donor.blood_group).await, 0);
  assert!(s.recent_logs(10).await.unwrap().is_empty());

  // Neither a second rejection nor an approval can move it again.
  assert!(matches!(
    s.reject_donation(d.donation_id).await.unwrap_err(),
    Error::DonationNotPending { .. }
  ));
  assert!(matches!(
    s.approve_donation(d.donation_id).await.unwrap_err(),
    Error::DonationNotPending { .. }
  ));

  let refreshed = s.donations_for_donor(donor.user_id).await.unwrap();
  assert_eq!(refreshed[0].status, DonationStatus::Rejected);
}

// ─── Request lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn request_approval_debits_stock_and_logs_negative_delta() {
  let s = store().await;
  let donor = add_user(&s, Role::Donor, "d@example.com", BloodGroup::BPos).await;
  let recip = add_user(&s, Role::Recipient, "r@example.com", BloodGroup::BPos).await;

  let d = s.create_donation(donation(&donor, 5)).await.unwrap();
  s.approve_donation(d.donation_id).await.unwrap();

  let r = s
    .create_request(request(&recip, BloodGroup::BPos, 2))
    .await
    .unwrap();
  let stock = s.approve_request(r.request_id).await.unwrap();
  assert_eq!(stock.units, 3);

  let logs = s.recent_logs(10).await.unwrap();
  let entry = logs
    .iter()
    .find(|l| l.entry.kind == LogKind::Request)
    .unwrap();
  assert_eq!(entry.entry.delta, -2);
  assert_eq!(entry.entry.related_request, Some(r.request_id));

  let refreshed = s.requests_for_recipient(recip.user_id).await.unwrap();
  assert_eq!(refreshed[0].status, RequestStatus::Approved);
}

#[tokio::test]
async fn insufficient_stock_refuses_and_mutates_nothing() {
  // BloodStock[A-] = 2; a 5-unit request is refused, stock stays 2, and the
  // request remains pending (it can still be approved after a restock).
  let s = store().await;
  let recip = add_user(&s, Role::Recipient, "r@example.com", BloodGroup::ANeg).await;

  s.adjust_stock(StockAdjustment {
    blood_group: BloodGroup::ANeg,
    units:       2,
    action:      StockAction::Set,
    description: None,
    adjusted_by: None,
  })
  .await
  .unwrap();

  let r = s
    .create_request(request(&recip, BloodGroup::ANeg, 5))
    .await
    .unwrap();

  let err = s.approve_request(r.request_id).await.unwrap_err();
  match err {
    Error::InsufficientStock { blood_group, available, requested } => {
      assert_eq!(blood_group, BloodGroup::ANeg);
      assert_eq!(available, 2);
      assert_eq!(requested, 5);
    }
    other => panic!("unexpected error: {other}"),
  }

  assert_eq!(stock_units(&s, BloodGroup::ANeg).await, 2);
  let refreshed = s.requests_for_recipient(recip.user_id).await.unwrap();
  assert_eq!(refreshed[0].status, RequestStatus::Pending);

  // After restocking, the same request approves cleanly.
  s.adjust_stock(StockAdjustment {
    blood_group: BloodGroup::ANeg,
    units:       10,
    action:      StockAction::Set,
    description: None,
    adjusted_by: None,
  })
  .await
  .unwrap();
  let stock = s.approve_request(r.request_id).await.unwrap();
  assert_eq!(stock.units, 5);
}

#[tokio::test]
async fn rejecting_request_leaves_inventory_alone() {
  let s = store().await;
  let recip = add_user(&s, Role::Recipient, "r@example.com", BloodGroup::OPos).await;
  let r = s
    .create_request(request(&recip, BloodGroup::OPos, 1))
    .await
    .unwrap();

  s.reject_request(r.request_id).await.unwrap();
  assert!(s.recent_logs(10).await.unwrap().is_empty());
  assert!(matches!(
    s.approve_request(r.request_id).await.unwrap_err(),
    Error::RequestNotPending { .. }
  ));
}

// ─── Manual adjustments ──────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_subtract_adjust_and_log() {
  let s = store().await;

  s.adjust_stock(StockAdjustment {
    blood_group: BloodGroup::OPos,
    units:       7,
    action:      StockAction::Add,
    description: Some("initial intake".into()),
    adjusted_by: None,
  })
  .await
  .unwrap();
  assert_eq!(stock_units(&s, BloodGroup::OPos).await, 7);

  let stock = s
    .adjust_stock(StockAdjustment {
      blood_group: BloodGroup::OPos,
      units:       3,
      action:      StockAction::Subtract,
      description: None,
      adjusted_by: None,
    })
    .await
    .unwrap();
  assert_eq!(stock.units, 4);

  let logs = s.recent_logs(10).await.unwrap();
  assert_eq!(logs.len(), 2);
  assert!(logs.iter().all(|l| l.entry.kind == LogKind::Adjustment));
  let deltas: Vec<i64> = logs.iter().map(|l| l.entry.delta).collect();
  assert!(deltas.contains(&7));
  assert!(deltas.contains(&-3));
}

#[tokio::test]
async fn subtract_below_zero_is_refused() {
  let s = store().await;

  s.adjust_stock(StockAdjustment {
    blood_group: BloodGroup::BNeg,
    units:       2,
    action:      StockAction::Add,
    description: None,
    adjusted_by: None,
  })
  .await
  .unwrap();

  let err = s
    .adjust_stock(StockAdjustment {
      blood_group: BloodGroup::BNeg,
      units:       3,
      action:      StockAction::Subtract,
      description: None,
      adjusted_by: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InsufficientStock { available: 2, .. }));

  // Refusal mutates nothing: count unchanged, no log entry appended.
  assert_eq!(stock_units(&s, BloodGroup::BNeg).await, 2);
  assert_eq!(s.recent_logs(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn set_overrides_and_logs_the_difference() {
  let s = store().await;

  s.adjust_stock(StockAdjustment {
    blood_group: BloodGroup::AbPos,
    units:       10,
    action:      StockAction::Set,
    description: None,
    adjusted_by: None,
  })
  .await
  .unwrap();

  // `set` below the current count is allowed — it is the documented
  // administrative override.
  let stock = s
    .adjust_stock(StockAdjustment {
      blood_group: BloodGroup::AbPos,
      units:       4,
      action:      StockAction::Set,
      description: None,
      adjusted_by: None,
    })
    .await
    .unwrap();
  assert_eq!(stock.units, 4);

  let logs = s.recent_logs(10).await.unwrap();
  let deltas: Vec<i64> = logs.iter().map(|l| l.entry.delta).collect();
  assert!(deltas.contains(&10));
  assert!(deltas.contains(&-6));
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_stock_reports_all_groups_zero_filled() {
  let s = store().await;
  let all = s.list_stock().await.unwrap();
  assert_eq!(all.len(), 8);
  assert!(all.iter().all(|row| row.units == 0));

  s.adjust_stock(StockAdjustment {
    blood_group: BloodGroup::ONeg,
    units:       1,
    action:      StockAction::Add,
    description: None,
    adjusted_by: None,
  })
  .await
  .unwrap();

  let all = s.list_stock().await.unwrap();
  assert_eq!(all.len(), 8);
  let o_neg = all.iter().find(|r| r.blood_group == BloodGroup::ONeg).unwrap();
  assert_eq!(o_neg.units, 1);
}

#[tokio::test]
async fn pending_listings_join_identity_and_respect_limit() {
  let s = store().await;
  let donor = add_user(&s, Role::Donor, "d@example.com", BloodGroup::OPos).await;
  for _ in 0..3 {
    s.create_donation(donation(&donor, 1)).await.unwrap();
  }

  assert_eq!(s.count_pending_donations().await.unwrap(), 3);

  let pending = s.pending_donations(2).await.unwrap();
  assert_eq!(pending.len(), 2);
  assert!(pending.iter().all(|p| p.donor_email == "d@example.com"));

  let recip = add_user(&s, Role::Recipient, "r@example.com", BloodGroup::BNeg).await;
  s.create_request(request(&recip, BloodGroup::BNeg, 1))
    .await
    .unwrap();
  assert_eq!(s.count_pending_requests().await.unwrap(), 1);
  let pending = s.pending_requests(5).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].recipient_name, recip.name);
}
