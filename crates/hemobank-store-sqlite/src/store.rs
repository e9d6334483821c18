//! [`SqliteStore`] — the SQLite implementation of [`BloodStore`].
//!
//! Multi-row mutations (approvals, adjustments) run inside one SQLite
//! transaction per call, and every status transition is a conditional
//! `UPDATE … WHERE status = 'pending'`. The affected-row count of that
//! UPDATE is the compare-and-swap: zero rows means some other writer got
//! there first (or the record never existed), and the transaction rolls
//! back without touching stock or the audit log.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hemobank_core::{
  Error, Result,
  blood::BloodGroup,
  donation::{Donation, DonationStatus, NewDonation},
  inventory::{BloodStock, StockAction, StockAdjustment},
  request::{BloodRequest, NewRequest, RequestStatus},
  store::{BloodStore, GroupCount, LogView, PendingDonation, PendingRequest},
  user::{NewUser, Role, User},
};

use crate::{
  encode::{
    RawDonation, RawLog, RawRequest, RawStock, RawUser, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Map a backend failure into the shared error taxonomy.
fn storage(e: tokio_rusqlite::Error) -> Error { Error::Storage(e.to_string()) }

// ─── Transaction outcomes ────────────────────────────────────────────────────
//
// Closures handed to tokio_rusqlite can only fail with its own error type,
// so domain-level outcomes (not pending, insufficient stock, …) are carried
// out of the closure in these enums and mapped to errors by the caller.

enum ApproveDonationOutcome {
  Approved(RawStock),
  Missing,
  NotPending(String),
}

enum ApproveRequestOutcome {
  Approved(RawStock),
  Missing,
  NotPending(String),
  Short { available: u32 },
}

enum RejectOutcome {
  Rejected,
  Missing,
  NotPending(String),
}

enum AdjustOutcome {
  Adjusted(RawStock),
  Short { available: u32 },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A hemobank store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(storage)
  }
}

// ─── BloodStore impl ─────────────────────────────────────────────────────────

impl BloodStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      name:          input.name,
      email:         input.email,
      password_hash: input.password_hash,
      role:          input.role,
      blood_group:   input.blood_group,
      phone:         input.phone,
      address:       input.address,
      age:           input.age,
      created_at:    Utc::now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let name      = user.name.clone();
    let email     = user.email.clone();
    let hash      = user.password_hash.clone();
    let role_str  = user.role.as_str().to_owned();
    let group_str = user.blood_group.as_str().to_owned();
    let phone     = user.phone.clone();
    let address   = user.address.clone();
    let age       = user.age;
    let at_str    = encode_dt(user.created_at);

    // The closure runs serialised on the store's single connection, so the
    // existence check and the insert cannot interleave with another writer.
    let taken: bool = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          return Ok(true);
        }

        conn.execute(
          "INSERT INTO users (
             user_id, name, email, password_hash, role, blood_group,
             phone, address, age, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, name, email, hash, role_str, group_str, phone, address,
            age, at_str,
          ],
        )?;
        Ok(false)
      })
      .await
      .map_err(storage)?;

    if taken {
      return Err(Error::EmailTaken(user.email));
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, name, email, password_hash, role, blood_group,
                      phone, address, age, created_at
               FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(storage)?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, name, email, password_hash, role, blood_group,
                      phone, address, age, created_at
               FROM users WHERE email = ?1",
              rusqlite::params![email],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(storage)?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn count_users_by_role(&self, role: Role) -> Result<u64> {
    let role_str = role.as_str().to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM users WHERE role = ?1",
          rusqlite::params![role_str],
          |r| r.get(0),
        )?)
      })
      .await
      .map_err(storage)?;

    Ok(count as u64)
  }

  async fn count_users_by_group(&self, role: Role) -> Result<Vec<GroupCount>> {
    let role_str = role.as_str().to_owned();

    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT blood_group, COUNT(*) FROM users
           WHERE role = ?1 GROUP BY blood_group",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], |r| {
            Ok((r.get(0)?, r.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    rows
      .into_iter()
      .map(|(group, count)| {
        Ok(GroupCount {
          blood_group: group.parse::<BloodGroup>()?,
          count:       count as u64,
        })
      })
      .collect()
  }

  // ── Donations ─────────────────────────────────────────────────────────────

  async fn create_donation(&self, input: NewDonation) -> Result<Donation> {
    let donation = Donation {
      donation_id: Uuid::new_v4(),
      donor_id:    input.donor_id,
      blood_group: input.blood_group,
      units:       input.units,
      status:      DonationStatus::Pending,
      location:    input.location,
      created_at:  Utc::now(),
    };

    let id_str    = encode_uuid(donation.donation_id);
    let donor_str = encode_uuid(donation.donor_id);
    let group_str = donation.blood_group.as_str().to_owned();
    let units     = donation.units;
    let location  = donation.location.clone();
    let at_str    = encode_dt(donation.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO donations (
             donation_id, donor_id, blood_group, units, status, location,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6)",
          rusqlite::params![id_str, donor_str, group_str, units, location, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(storage)?;

    Ok(donation)
  }

  async fn donations_for_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>> {
    let donor_str = encode_uuid(donor_id);

    let raws: Vec<RawDonation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT donation_id, donor_id, blood_group, units, status,
                  location, created_at
           FROM donations WHERE donor_id = ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![donor_str], donation_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws.into_iter().map(RawDonation::into_donation).collect()
  }

  async fn pending_donations(&self, limit: u32) -> Result<Vec<PendingDonation>> {
    let raws: Vec<(RawDonation, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.donation_id, d.donor_id, d.blood_group, d.units,
                  d.status, d.location, d.created_at, u.name, u.email
           FROM donations d
           JOIN users u ON u.user_id = d.donor_id
           WHERE d.status = 'pending'
           ORDER BY d.created_at DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![i64::from(limit)], |r| {
            Ok((donation_from_row(r)?, r.get(7)?, r.get(8)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws
      .into_iter()
      .map(|(raw, donor_name, donor_email)| {
        Ok(PendingDonation {
          donation: raw.into_donation()?,
          donor_name,
          donor_email,
        })
      })
      .collect()
  }

  async fn count_pending_donations(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM donations WHERE status = 'pending'",
          [],
          |r| r.get(0),
        )?)
      })
      .await
      .map_err(storage)?;
    Ok(count as u64)
  }

  async fn approve_donation(&self, id: Uuid) -> Result<BloodStock> {
    let id_str  = encode_uuid(id);
    let log_str = encode_uuid(Uuid::new_v4());
    let now_str = encode_dt(Utc::now());

    let outcome: ApproveDonationOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Compare-and-swap on the status column. Zero affected rows means
        // the donation is missing or already terminal.
        let changed = tx.execute(
          "UPDATE donations SET status = 'approved'
           WHERE donation_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str],
        )?;

        if changed == 0 {
          let status: Option<String> = tx
            .query_row(
              "SELECT status FROM donations WHERE donation_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?;
          // Dropping the transaction rolls it back; nothing was written.
          return Ok(match status {
            None => ApproveDonationOutcome::Missing,
            Some(s) => ApproveDonationOutcome::NotPending(s),
          });
        }

        let (group_str, units, donor_str, donor_name): (String, u32, String, String) =
          tx.query_row(
            "SELECT d.blood_group, d.units, d.donor_id, u.name
             FROM donations d JOIN users u ON u.user_id = d.donor_id
             WHERE d.donation_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
          )?;

        tx.execute(
          "INSERT INTO blood_stock (blood_group, units, last_updated)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(blood_group) DO UPDATE SET
             units = units + excluded.units,
             last_updated = excluded.last_updated",
          rusqlite::params![group_str, units, now_str],
        )?;

        tx.execute(
          "INSERT INTO inventory_log (
             log_id, blood_group, delta, kind, description,
             related_user, related_donation, recorded_at
           ) VALUES (?1, ?2, ?3, 'donation', ?4, ?5, ?6, ?7)",
          rusqlite::params![
            log_str,
            group_str,
            i64::from(units),
            format!("Donation from {donor_name}"),
            donor_str,
            id_str,
            now_str,
          ],
        )?;

        let stock = stock_row(&tx, &group_str)?;
        tx.commit()?;
        Ok(ApproveDonationOutcome::Approved(stock))
      })
      .await
      .map_err(storage)?;

    match outcome {
      ApproveDonationOutcome::Approved(raw) => raw.into_stock(),
      ApproveDonationOutcome::Missing => Err(Error::DonationNotFound(id)),
      ApproveDonationOutcome::NotPending(status) => {
        Err(Error::DonationNotPending { id, status })
      }
    }
  }

  async fn reject_donation(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let outcome: RejectOutcome = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE donations SET status = 'rejected'
           WHERE donation_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str],
        )?;
        if changed > 0 {
          return Ok(RejectOutcome::Rejected);
        }
        let status: Option<String> = conn
          .query_row(
            "SELECT status FROM donations WHERE donation_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(match status {
          None => RejectOutcome::Missing,
          Some(s) => RejectOutcome::NotPending(s),
        })
      })
      .await
      .map_err(storage)?;

    match outcome {
      RejectOutcome::Rejected => Ok(()),
      RejectOutcome::Missing => Err(Error::DonationNotFound(id)),
      RejectOutcome::NotPending(status) => {
        Err(Error::DonationNotPending { id, status })
      }
    }
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn create_request(&self, input: NewRequest) -> Result<BloodRequest> {
    let request = BloodRequest {
      request_id:   Uuid::new_v4(),
      recipient_id: input.recipient_id,
      blood_group:  input.blood_group,
      units:        input.units,
      urgency:      input.urgency,
      status:       RequestStatus::Pending,
      location:     input.location,
      hospital:     input.hospital,
      required_by:  input.required_by,
      created_at:   Utc::now(),
    };

    let id_str        = encode_uuid(request.request_id);
    let recipient_str = encode_uuid(request.recipient_id);
    let group_str     = request.blood_group.as_str().to_owned();
    let units         = request.units;
    let urgency_str   = request.urgency.as_str().to_owned();
    let location      = request.location.clone();
    let hospital      = request.hospital.clone();
    let required_str  = request.required_by.map(encode_date);
    let at_str        = encode_dt(request.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO requests (
             request_id, recipient_id, blood_group, units, urgency, status,
             location, hospital, required_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, recipient_str, group_str, units, urgency_str, location,
            hospital, required_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(storage)?;

    Ok(request)
  }

  async fn requests_for_recipient(
    &self,
    recipient_id: Uuid,
  ) -> Result<Vec<BloodRequest>> {
    let recipient_str = encode_uuid(recipient_id);

    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT request_id, recipient_id, blood_group, units, urgency,
                  status, location, hospital, required_by, created_at
           FROM requests WHERE recipient_id = ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![recipient_str], request_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn pending_requests(&self, limit: u32) -> Result<Vec<PendingRequest>> {
    let raws: Vec<(RawRequest, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.request_id, r.recipient_id, r.blood_group, r.units,
                  r.urgency, r.status, r.location, r.hospital, r.required_by,
                  r.created_at, u.name, u.email
           FROM requests r
           JOIN users u ON u.user_id = r.recipient_id
           WHERE r.status = 'pending'
           ORDER BY r.created_at DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![i64::from(limit)], |r| {
            Ok((request_from_row(r)?, r.get(10)?, r.get(11)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws
      .into_iter()
      .map(|(raw, recipient_name, recipient_email)| {
        Ok(PendingRequest {
          request: raw.into_request()?,
          recipient_name,
          recipient_email,
        })
      })
      .collect()
  }

  async fn count_pending_requests(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM requests WHERE status = 'pending'",
          [],
          |r| r.get(0),
        )?)
      })
      .await
      .map_err(storage)?;
    Ok(count as u64)
  }

  async fn approve_request(&self, id: Uuid) -> Result<BloodStock> {
    let id_str  = encode_uuid(id);
    let log_str = encode_uuid(Uuid::new_v4());
    let now_str = encode_dt(Utc::now());

    let outcome: ApproveRequestOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let changed = tx.execute(
          "UPDATE requests SET status = 'approved'
           WHERE request_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str],
        )?;

        if changed == 0 {
          let status: Option<String> = tx
            .query_row(
              "SELECT status FROM requests WHERE request_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?;
          return Ok(match status {
            None => ApproveRequestOutcome::Missing,
            Some(s) => ApproveRequestOutcome::NotPending(s),
          });
        }

        let (group_str, units, recipient_str, recipient_name): (String, u32, String, String) =
          tx.query_row(
            "SELECT r.blood_group, r.units, r.recipient_id, u.name
             FROM requests r JOIN users u ON u.user_id = r.recipient_id
             WHERE r.request_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
          )?;

        let available: u32 = tx
          .query_row(
            "SELECT units FROM blood_stock WHERE blood_group = ?1",
            rusqlite::params![group_str],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or(0);

        if available < units {
          // Roll back the status CAS by dropping the transaction.
          return Ok(ApproveRequestOutcome::Short { available });
        }

        tx.execute(
          "UPDATE blood_stock SET units = units - ?2, last_updated = ?3
           WHERE blood_group = ?1",
          rusqlite::params![group_str, units, now_str],
        )?;

        tx.execute(
          "INSERT INTO inventory_log (
             log_id, blood_group, delta, kind, description,
             related_user, related_request, recorded_at
           ) VALUES (?1, ?2, ?3, 'request', ?4, ?5, ?6, ?7)",
          rusqlite::params![
            log_str,
            group_str,
            -i64::from(units),
            format!("Request for {recipient_name}"),
            recipient_str,
            id_str,
            now_str,
          ],
        )?;

        let stock = stock_row(&tx, &group_str)?;
        tx.commit()?;
        Ok(ApproveRequestOutcome::Approved(stock))
      })
      .await
      .map_err(storage)?;

    match outcome {
      ApproveRequestOutcome::Approved(raw) => raw.into_stock(),
      ApproveRequestOutcome::Missing => Err(Error::RequestNotFound(id)),
      ApproveRequestOutcome::NotPending(status) => {
        Err(Error::RequestNotPending { id, status })
      }
      ApproveRequestOutcome::Short { available } => {
        // The blood group and requested units come from the record itself;
        // re-read them for the error message.
        let request = self.request_fields(id).await?;
        Err(Error::InsufficientStock {
          blood_group: request.0,
          available,
          requested: request.1,
        })
      }
    }
  }

  async fn reject_request(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let outcome: RejectOutcome = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE requests SET status = 'rejected'
           WHERE request_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str],
        )?;
        if changed > 0 {
          return Ok(RejectOutcome::Rejected);
        }
        let status: Option<String> = conn
          .query_row(
            "SELECT status FROM requests WHERE request_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(match status {
          None => RejectOutcome::Missing,
          Some(s) => RejectOutcome::NotPending(s),
        })
      })
      .await
      .map_err(storage)?;

    match outcome {
      RejectOutcome::Rejected => Ok(()),
      RejectOutcome::Missing => Err(Error::RequestNotFound(id)),
      RejectOutcome::NotPending(status) => {
        Err(Error::RequestNotPending { id, status })
      }
    }
  }

  // ── Inventory ─────────────────────────────────────────────────────────────

  async fn list_stock(&self) -> Result<Vec<BloodStock>> {
    let raws: Vec<RawStock> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT blood_group, units, last_updated FROM blood_stock",
        )?;
        let rows = stmt
          .query_map([], |r| {
            Ok(RawStock {
              blood_group:  r.get(0)?,
              units:        r.get(1)?,
              last_updated: r.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    let stored: Vec<BloodStock> = raws
      .into_iter()
      .map(RawStock::into_stock)
      .collect::<Result<_>>()?;

    // Report every group, zero-filled, in display order.
    Ok(
      BloodGroup::ALL
        .into_iter()
        .map(|group| {
          stored
            .iter()
            .find(|s| s.blood_group == group)
            .cloned()
            .unwrap_or_else(|| BloodStock::empty(group))
        })
        .collect(),
    )
  }

  async fn adjust_stock(&self, input: StockAdjustment) -> Result<BloodStock> {
    let group       = input.blood_group;
    let group_str   = group.as_str().to_owned();
    let amount      = input.units;
    let action      = input.action;
    let description = input
      .description
      .filter(|d| !d.is_empty())
      .unwrap_or_else(|| format!("{} {} units", action.as_str(), amount));
    let admin_str   = input.adjusted_by.map(encode_uuid);
    let log_str     = encode_uuid(Uuid::new_v4());
    let now_str     = encode_dt(Utc::now());

    let outcome: AdjustOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: u32 = tx
          .query_row(
            "SELECT units FROM blood_stock WHERE blood_group = ?1",
            rusqlite::params![group_str],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or(0);

        let new_units = match action {
          StockAction::Add => current.saturating_add(amount),
          StockAction::Subtract => {
            if amount > current {
              return Ok(AdjustOutcome::Short { available: current });
            }
            current - amount
          }
          // Administrative override: replaces the count outright.
          StockAction::Set => amount,
        };

        tx.execute(
          "INSERT INTO blood_stock (blood_group, units, last_updated)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(blood_group) DO UPDATE SET
             units = excluded.units,
             last_updated = excluded.last_updated",
          rusqlite::params![group_str, new_units, now_str],
        )?;

        let delta = i64::from(new_units) - i64::from(current);
        tx.execute(
          "INSERT INTO inventory_log (
             log_id, blood_group, delta, kind, description,
             related_user, recorded_at
           ) VALUES (?1, ?2, ?3, 'adjustment', ?4, ?5, ?6)",
          rusqlite::params![log_str, group_str, delta, description, admin_str, now_str],
        )?;

        let stock = stock_row(&tx, &group_str)?;
        tx.commit()?;
        Ok(AdjustOutcome::Adjusted(stock))
      })
      .await
      .map_err(storage)?;

    match outcome {
      AdjustOutcome::Adjusted(raw) => raw.into_stock(),
      AdjustOutcome::Short { available } => Err(Error::InsufficientStock {
        blood_group: group,
        available,
        requested: amount,
      }),
    }
  }

  async fn recent_logs(&self, limit: u32) -> Result<Vec<LogView>> {
    let raws: Vec<(RawLog, Option<String>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT l.log_id, l.blood_group, l.delta, l.kind, l.description,
                  l.related_user, l.related_donation, l.related_request,
                  l.recorded_at, u.name
           FROM inventory_log l
           LEFT JOIN users u ON u.user_id = l.related_user
           ORDER BY l.recorded_at DESC, l.log_id
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![i64::from(limit)], |r| {
            Ok((
              RawLog {
                log_id:           r.get(0)?,
                blood_group:      r.get(1)?,
                delta:            r.get(2)?,
                kind:             r.get(3)?,
                description:      r.get(4)?,
                related_user:     r.get(5)?,
                related_donation: r.get(6)?,
                related_request:  r.get(7)?,
                recorded_at:      r.get(8)?,
              },
              r.get(9)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws
      .into_iter()
      .map(|(raw, user_name)| {
        Ok(LogView { entry: raw.into_entry()?, user_name })
      })
      .collect()
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Blood group and unit count of a request, for error reporting.
  async fn request_fields(&self, id: Uuid) -> Result<(BloodGroup, u32)> {
    let id_str = encode_uuid(id);

    let row: Option<(String, u32)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT blood_group, units FROM requests WHERE request_id = ?1",
              rusqlite::params![id_str],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await
      .map_err(storage)?;

    let (group_str, units) = row.ok_or(Error::RequestNotFound(id))?;
    Ok((group_str.parse()?, units))
  }
}

fn user_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       r.get(0)?,
    name:          r.get(1)?,
    email:         r.get(2)?,
    password_hash: r.get(3)?,
    role:          r.get(4)?,
    blood_group:   r.get(5)?,
    phone:         r.get(6)?,
    address:       r.get(7)?,
    age:           r.get(8)?,
    created_at:    r.get(9)?,
  })
}

fn donation_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawDonation> {
  Ok(RawDonation {
    donation_id: r.get(0)?,
    donor_id:    r.get(1)?,
    blood_group: r.get(2)?,
    units:       r.get(3)?,
    status:      r.get(4)?,
    location:    r.get(5)?,
    created_at:  r.get(6)?,
  })
}

fn request_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawRequest> {
  Ok(RawRequest {
    request_id:   r.get(0)?,
    recipient_id: r.get(1)?,
    blood_group:  r.get(2)?,
    units:        r.get(3)?,
    urgency:      r.get(4)?,
    status:       r.get(5)?,
    location:     r.get(6)?,
    hospital:     r.get(7)?,
    required_by:  r.get(8)?,
    created_at:   r.get(9)?,
  })
}

fn stock_row(
  tx: &rusqlite::Transaction<'_>,
  group_str: &str,
) -> rusqlite::Result<RawStock> {
  tx.query_row(
    "SELECT blood_group, units, last_updated FROM blood_stock
     WHERE blood_group = ?1",
    rusqlite::params![group_str],
    |r| {
      Ok(RawStock {
        blood_group:  r.get(0)?,
        units:        r.get(1)?,
        last_updated: r.get(2)?,
      })
    },
  )
}
