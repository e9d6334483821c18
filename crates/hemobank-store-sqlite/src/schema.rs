//! SQL schema for the hemobank SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.
//!
//! The `CHECK` constraints restate invariants the store logic already
//! enforces (positive units, non-negative stock, mutually exclusive log
//! back-references); the logic never relies on them, they only catch bugs.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    role          TEXT NOT NULL,   -- 'donor' | 'recipient' | 'admin'
    blood_group   TEXT NOT NULL,
    phone         TEXT,
    address       TEXT,
    age           INTEGER,
    created_at    TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS donations (
    donation_id TEXT PRIMARY KEY,
    donor_id    TEXT NOT NULL REFERENCES users(user_id),
    blood_group TEXT NOT NULL,
    units       INTEGER NOT NULL CHECK (units > 0),
    status      TEXT NOT NULL DEFAULT 'pending',
    location    TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requests (
    request_id   TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL REFERENCES users(user_id),
    blood_group  TEXT NOT NULL,
    units        INTEGER NOT NULL CHECK (units > 0),
    urgency      TEXT NOT NULL DEFAULT 'medium',
    status       TEXT NOT NULL DEFAULT 'pending',
    location     TEXT,
    hospital     TEXT,
    required_by  TEXT,             -- ISO 8601 date or NULL
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blood_stock (
    blood_group  TEXT PRIMARY KEY,
    units        INTEGER NOT NULL DEFAULT 0 CHECK (units >= 0),
    last_updated TEXT NOT NULL
);

-- The audit trail is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS inventory_log (
    log_id           TEXT PRIMARY KEY,
    blood_group      TEXT NOT NULL,
    delta            INTEGER NOT NULL,  -- signed unit change
    kind             TEXT NOT NULL,     -- 'donation' | 'request' | 'adjustment'
    description      TEXT,
    related_user     TEXT REFERENCES users(user_id),
    related_donation TEXT REFERENCES donations(donation_id),
    related_request  TEXT REFERENCES requests(request_id),
    recorded_at      TEXT NOT NULL,
    CHECK (related_donation IS NULL OR related_request IS NULL)
);

CREATE INDEX IF NOT EXISTS donations_donor_idx    ON donations(donor_id);
CREATE INDEX IF NOT EXISTS donations_status_idx   ON donations(status);
CREATE INDEX IF NOT EXISTS requests_recipient_idx ON requests(recipient_id);
CREATE INDEX IF NOT EXISTS requests_status_idx    ON requests(status);
CREATE INDEX IF NOT EXISTS log_recorded_idx       ON inventory_log(recorded_at);

PRAGMA user_version = 1;
";
